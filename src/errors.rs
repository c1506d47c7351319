// ==============================================================================
// errors.rs - Analysis Failure Taxonomy
// ==============================================================================
// Description: Fixed vocabulary of failure causes surfaced uniformly to callers
// ==============================================================================

use serde::Serialize;
use thiserror::Error;

/// Failure cause for one algorithm run.
///
/// Every variant carries the human-readable reason returned to the client in
/// the `reason` field. All of these are handled inside the run lifecycle and
/// converted into a failed outcome; none escapes to the transport layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Underlying store query failed or referenced an unknown collection.
    #[error("{0}")]
    DataFetch(String),

    /// A required frame is empty after alignment.
    #[error("{0}")]
    NoData(String),

    /// The statistical routine raised an error during execution.
    #[error("{0}")]
    Compute(String),

    /// The routine returned a structurally valid but all-NaN result.
    #[error("{0}")]
    DegenerateResult(String),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::DataFetch(_) => ErrorKind::DataFetchError,
            AnalysisError::NoData(_) => ErrorKind::NoDataError,
            AnalysisError::Compute(_) => ErrorKind::ComputeError,
            AnalysisError::DegenerateResult(_) => ErrorKind::DegenerateResultError,
        }
    }

    /// The reason string returned to the client.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Error category tags. `ConfigError` is produced at startup only (see
/// `config`); the remaining kinds are produced per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ConfigError,
    DataFetchError,
    NoDataError,
    ComputeError,
    DegenerateResultError,
}
