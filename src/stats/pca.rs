// ==============================================================================
// pca.rs - Principal Component Analysis
// ==============================================================================
// Description: Centered thin-SVD principal component analysis
// ==============================================================================

use nalgebra::DMatrix;

use crate::warnings;

use super::{center_columns, StatsError};

/// Output of one PCA fit on an n×p observation matrix.
pub struct PcaFit {
    /// n×k projection of the observations onto the components.
    pub scores: DMatrix<f64>,
    /// k×p principal axes, one component per row.
    pub components: DMatrix<f64>,
    /// Fraction of total variance carried by each component.
    pub explained_variance_ratio: Vec<f64>,
}

/// Fit a PCA with `n_components` components.
///
/// Columns are centered, then decomposed with a thin SVD; scores are
/// `U * diag(sigma)` truncated to the requested component count.
pub fn fit(x: &DMatrix<f64>, n_components: usize) -> Result<PcaFit, StatsError> {
    let (n, p) = x.shape();
    if n == 0 || p == 0 {
        return Err(StatsError::EmptyInput);
    }
    let max = n.min(p);
    if n_components == 0 || n_components > max {
        return Err(StatsError::BadComponentCount {
            requested: n_components,
            max,
        });
    }

    let centered = center_columns(x);
    let svd = centered.svd(true, true);
    let u = svd.u.as_ref().ok_or(StatsError::SvdFailed)?;
    let v_t = svd.v_t.as_ref().ok_or(StatsError::SvdFailed)?;
    let sigma = &svd.singular_values;

    let total: f64 = sigma.iter().map(|s| s * s).sum();
    if total == 0.0 {
        // every observation identical; ratios below degrade to NaN
        warnings::emit("total variance of input is zero");
    }

    let mut scores = DMatrix::zeros(n, n_components);
    for k in 0..n_components {
        for r in 0..n {
            scores[(r, k)] = u[(r, k)] * sigma[k];
        }
    }
    let components = v_t.rows(0, n_components).into_owned();
    let explained_variance_ratio = (0..n_components)
        .map(|k| sigma[k] * sigma[k] / total)
        .collect();

    Ok(PcaFit {
        scores,
        components,
        explained_variance_ratio,
    })
}
