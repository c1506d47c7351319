// ==============================================================================
// correlation.rs - Pairwise Row Correlation
// ==============================================================================
// Description: Pearson correlation of each row of one matrix against another
// ==============================================================================

use nalgebra::{DMatrix, DVector};

use crate::warnings;

use super::StatsError;

/// Correlate every row of `b` against every row of `a` over their shared
/// column dimension.
///
/// Returns a `b.nrows()` × `a.nrows()` matrix: entry (i, j) is the Pearson
/// correlation of `b` row i with `a` row j. This is the bottom-left block of
/// the full correlation matrix over the stacked rows of `a` and `b`.
/// Zero-variance rows produce NaN entries and a warning, not an error.
pub fn row_correlation(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<DMatrix<f64>, StatsError> {
    if a.nrows() == 0 || b.nrows() == 0 || a.ncols() == 0 {
        return Err(StatsError::EmptyInput);
    }
    if a.ncols() != b.ncols() {
        return Err(StatsError::ShapeMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }

    let a_centered = center_rows(a);
    let b_centered = center_rows(b);
    let a_norms: Vec<f64> = (0..a_centered.nrows())
        .map(|r| a_centered.row(r).norm())
        .collect();
    let b_norms: Vec<f64> = (0..b_centered.nrows())
        .map(|r| b_centered.row(r).norm())
        .collect();

    let mut warned = false;
    let mut out = DMatrix::zeros(b.nrows(), a.nrows());
    for i in 0..b.nrows() {
        for j in 0..a.nrows() {
            let denom = b_norms[i] * a_norms[j];
            if denom == 0.0 {
                if !warned {
                    warnings::emit("invalid value encountered in row correlation (zero-variance row)");
                    warned = true;
                }
                out[(i, j)] = f64::NAN;
            } else {
                out[(i, j)] = b_centered.row(i).dot(&a_centered.row(j)) / denom;
            }
        }
    }
    Ok(out)
}

fn center_rows(x: &DMatrix<f64>) -> DMatrix<f64> {
    let p = x.ncols() as f64;
    let mut centered = x.clone();
    for mut row in centered.row_iter_mut() {
        let mean = row.sum() / p;
        row.add_scalar_mut(-mean);
    }
    centered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warnings::WarningScope;

    #[test]
    fn test_identical_rows_correlate_to_one() {
        let a = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let b = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 3.0, 2.0, 1.0]);
        let d = row_correlation(&a, &b).unwrap();
        assert_eq!(d.shape(), (2, 1));
        assert!((d[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((d[(1, 0)] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_orientation_is_b_rows_by_a_rows() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 1.0, 5.0, 9.0]);
        let b = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let d = row_correlation(&a, &b).unwrap();
        assert_eq!(d.shape(), (1, 3));
    }

    #[test]
    fn test_zero_variance_row_yields_nan_and_warning() {
        let a = DMatrix::from_row_slice(1, 3, &[2.0, 2.0, 2.0]);
        let b = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let scope = WarningScope::enter();
        let d = row_correlation(&a, &b).unwrap();
        let collected = scope.finish();
        assert!(d[(0, 0)].is_nan());
        assert_eq!(collected.len(), 1);
        assert!(collected[0].contains("zero-variance"));
    }

    #[test]
    fn test_column_count_mismatch_rejected() {
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let b = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        assert!(matches!(
            row_correlation(&a, &b),
            Err(StatsError::ShapeMismatch { .. })
        ));
    }
}
