// ==============================================================================
// pls.rs - Partial Least Squares Regression
// ==============================================================================
// Description: NIPALS PLS2 regression of a clinical block on a molecular block
// ==============================================================================

use nalgebra::{DMatrix, DVector};

use crate::warnings;

use super::{center_columns, StatsError};

const MAX_ITER: usize = 500;
const TOL: f64 = 1e-6;
const EPS: f64 = 1e-12;

/// Output of one PLS2 fit: X is n×p, Y is n×q, k components.
pub struct PlsFit {
    /// n×k X-block scores.
    pub x_scores: DMatrix<f64>,
    /// n×k Y-block scores.
    pub y_scores: DMatrix<f64>,
    /// p×k X-block loadings.
    pub x_loadings: DMatrix<f64>,
    /// q×k Y-block loadings.
    pub y_loadings: DMatrix<f64>,
    /// p×q regression coefficients mapping X onto Y.
    pub coefficients: DMatrix<f64>,
}

/// Fit a PLS2 regression with `n_components` components via NIPALS.
///
/// Both blocks are column-centered. If a Y residual becomes effectively
/// constant before all requested components are extracted, the fit stops
/// early with a warning and the component matrices are truncated to what was
/// extracted.
pub fn fit(x: &DMatrix<f64>, y: &DMatrix<f64>, n_components: usize) -> Result<PlsFit, StatsError> {
    let (n, p) = x.shape();
    let (n_y, q) = y.shape();
    if n == 0 || p == 0 || q == 0 {
        return Err(StatsError::EmptyInput);
    }
    if n != n_y {
        return Err(StatsError::ShapeMismatch {
            left: (n, p),
            right: (n_y, q),
        });
    }
    let max = n.min(p);
    if n_components == 0 || n_components > max {
        return Err(StatsError::BadComponentCount {
            requested: n_components,
            max,
        });
    }

    let mut e = center_columns(x);
    let mut f = center_columns(y);

    let mut x_scores = DMatrix::zeros(n, n_components);
    let mut y_scores = DMatrix::zeros(n, n_components);
    let mut weights = DMatrix::zeros(p, n_components);
    let mut x_loadings = DMatrix::zeros(p, n_components);
    let mut y_loadings = DMatrix::zeros(q, n_components);

    let mut extracted = 0;
    for a in 0..n_components {
        if f.norm() < EPS {
            warnings::emit(format!(
                "Y residual is constant at component {}; stopping early",
                a + 1
            ));
            break;
        }

        // start from the Y column with the largest remaining variance
        let start = (0..q)
            .max_by(|&i, &j| {
                f.column(i)
                    .norm_squared()
                    .partial_cmp(&f.column(j).norm_squared())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        let mut u: DVector<f64> = f.column(start).into_owned();
        let mut w: DVector<f64> = DVector::zeros(p);
        let mut t: DVector<f64> = DVector::zeros(n);

        for _ in 0..MAX_ITER {
            w = e.transpose() * &u;
            let w_norm = w.norm();
            if w_norm < EPS {
                break;
            }
            w /= w_norm;
            t = &e * &w;
            let t_sq = t.dot(&t);
            if t_sq < EPS {
                break;
            }
            let c = f.transpose() * &t / t_sq;
            let c_sq = c.dot(&c);
            if c_sq < EPS {
                break;
            }
            let u_next = &f * &c / c_sq;
            let delta = (&u_next - &u).norm();
            let scale = u_next.norm().max(EPS);
            u = u_next;
            if delta <= TOL * scale {
                break;
            }
        }

        let t_sq = t.dot(&t);
        if t_sq < EPS {
            warnings::emit(format!(
                "X scores vanished at component {}; stopping early",
                a + 1
            ));
            break;
        }

        let p_a = e.transpose() * &t / t_sq;
        let q_a = f.transpose() * &t / t_sq;
        e -= &t * p_a.transpose();
        f -= &t * q_a.transpose();

        x_scores.set_column(a, &t);
        y_scores.set_column(a, &u);
        weights.set_column(a, &w);
        x_loadings.set_column(a, &p_a);
        y_loadings.set_column(a, &q_a);
        extracted += 1;
    }

    if extracted == 0 {
        return Err(StatsError::NoComponents);
    }
    if extracted < n_components {
        x_scores = x_scores.columns(0, extracted).into_owned();
        y_scores = y_scores.columns(0, extracted).into_owned();
        weights = weights.columns(0, extracted).into_owned();
        x_loadings = x_loadings.columns(0, extracted).into_owned();
        y_loadings = y_loadings.columns(0, extracted).into_owned();
    }

    // B = W (P'W)^-1 Q'
    let ptw = x_loadings.transpose() * &weights;
    let inv = ptw.try_inverse().ok_or(StatsError::Singular)?;
    let coefficients = &weights * inv * y_loadings.transpose();

    Ok(PlsFit {
        x_scores,
        y_scores,
        x_loadings,
        y_loadings,
        coefficients,
    })
}
