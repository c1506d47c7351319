// ==============================================================================
// mod.rs - Statistical Routines
// ==============================================================================
// Description: Dense-matrix numerical routines invoked by the run lifecycle
// ==============================================================================
// The routines here are the pipeline's external collaborators: they consume
// NA-free matrices produced by alignment and return dense numeric output.
// Errors surface through Result; non-fatal diagnostics go through the
// warnings scope installed by the caller.
// ==============================================================================

pub mod correlation;
pub mod pca;
pub mod pls;

use nalgebra::DMatrix;
use thiserror::Error;

/// Errors raised by the statistical routines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("input matrix is empty")]
    EmptyInput,

    #[error("n_components={requested} is invalid; must be between 1 and {max}")]
    BadComponentCount { requested: usize, max: usize },

    #[error("shape mismatch: {left:?} is incompatible with {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("singular value decomposition did not converge")]
    SvdFailed,

    #[error("no components could be extracted; Y residual is constant")]
    NoComponents,

    #[error("coefficient system is singular")]
    Singular,
}

/// Subtract each column's mean from that column.
pub(crate) fn center_columns(x: &DMatrix<f64>) -> DMatrix<f64> {
    let n = x.nrows() as f64;
    let mut centered = x.clone();
    for mut column in centered.column_iter_mut() {
        let mean = column.sum() / n;
        column.add_scalar_mut(-mean);
    }
    centered
}
