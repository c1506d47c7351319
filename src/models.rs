// ==============================================================================
// models.rs - API Data Models
// ==============================================================================
// Description: Request/response models for the analysis endpoints
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::algorithms::distance::DistancePayload;
use crate::algorithms::pca::PcaPayload;
use crate::algorithms::plsr::PlsrPayload;
use crate::runner::RunOutcome;
use crate::shape::ShapedRecord;

/// PCA request body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PcaRequest {
    pub disease: String,
    /// Gene allow-list; empty means the whole collection.
    pub genes: Vec<String>,
    #[serde(default)]
    pub samples: Option<Vec<String>>,
    #[validate(range(min = 1))]
    pub n_components: usize,
    pub molecular_collection: String,
}

/// PLSR request body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PlsrRequest {
    pub disease: String,
    pub genes: Vec<String>,
    #[serde(default)]
    pub samples: Option<Vec<String>>,
    #[validate(range(min = 1))]
    pub n_components: usize,
    pub molecular_collection: String,
    pub clinical_collection: String,
    #[validate(length(min = 1))]
    pub features: Vec<String>,
}

/// Distance request body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DistanceRequest {
    pub genes: Vec<String>,
    #[serde(default)]
    pub samples: Option<Vec<String>>,
    #[validate(range(min = 1))]
    pub n_components: usize,
    pub molecular_collection: String,
    pub molecular_collection2: String,
}

/// PCA response. Numeric fields are null on failure, with `reason` set;
/// `warning` appears only when at least one warning was recorded.
#[derive(Debug, Serialize)]
pub struct PcaResponse {
    pub disease: String,
    #[serde(rename = "dataType")]
    pub data_type: &'static str,
    pub score: &'static str,
    pub loading: &'static str,
    #[serde(rename = "default")]
    pub is_default: bool,
    pub scores: Option<Vec<ShapedRecord>>,
    pub loadings: Option<Vec<ShapedRecord>>,
    pub metadata: Option<PcaMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct PcaMetadata {
    pub variance: Vec<f64>,
}

impl PcaResponse {
    pub fn from_outcome(disease: impl Into<String>, outcome: RunOutcome<PcaPayload>) -> Self {
        let mut response = PcaResponse {
            disease: disease.into(),
            data_type: "PCA",
            score: "sample",
            loading: "hugo",
            is_default: false,
            scores: None,
            loadings: None,
            metadata: None,
            reason: None,
            warning: None,
        };
        match outcome {
            RunOutcome::Success { payload, warnings } => {
                response.scores = Some(payload.scores);
                response.loadings = Some(payload.loadings);
                response.metadata = Some(PcaMetadata {
                    variance: payload.variance,
                });
                if !warnings.is_empty() {
                    response.warning = Some(warnings);
                }
            }
            RunOutcome::Failure { error } => {
                response.reason = Some(error.reason());
            }
        }
        response
    }
}

/// PLSR response. The loading field names carry dots for compatibility with
/// existing consumers of the service.
#[derive(Debug, Serialize)]
pub struct PlsrResponse {
    pub disease: String,
    #[serde(rename = "dataType")]
    pub data_type: &'static str,
    pub score: &'static str,
    pub x_loading: &'static str,
    pub y_loading: &'static str,
    #[serde(rename = "default")]
    pub is_default: bool,
    pub x_scores: Option<Vec<ShapedRecord>>,
    pub y_scores: Option<Vec<ShapedRecord>>,
    #[serde(rename = "x.loadings")]
    pub x_loadings: Option<Vec<ShapedRecord>>,
    #[serde(rename = "y.loadings")]
    pub y_loadings: Option<Vec<ShapedRecord>>,
    pub metadata: Option<Vec<ShapedRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<Vec<String>>,
}

impl PlsrResponse {
    pub fn from_outcome(disease: impl Into<String>, outcome: RunOutcome<PlsrPayload>) -> Self {
        let mut response = PlsrResponse {
            disease: disease.into(),
            data_type: "PLSR",
            score: "sample",
            x_loading: "hugo",
            y_loading: "feature",
            is_default: false,
            x_scores: None,
            y_scores: None,
            x_loadings: None,
            y_loadings: None,
            metadata: None,
            reason: None,
            warning: None,
        };
        match outcome {
            RunOutcome::Success { payload, warnings } => {
                response.x_scores = Some(payload.x_scores);
                response.y_scores = Some(payload.y_scores);
                response.x_loadings = Some(payload.x_loadings);
                response.y_loadings = Some(payload.y_loadings);
                response.metadata = Some(payload.coefficients);
                if !warnings.is_empty() {
                    response.warning = Some(warnings);
                }
            }
            RunOutcome::Failure { error } => {
                response.reason = Some(error.reason());
            }
        }
        response
    }
}

/// Distance response. `metadata` is reserved and always null.
#[derive(Debug, Serialize)]
pub struct DistanceResponse {
    #[serde(rename = "dataType")]
    pub data_type: &'static str,
    #[serde(rename = "D")]
    pub d: Option<Vec<ShapedRecord>>,
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<Vec<String>>,
}

impl DistanceResponse {
    pub fn from_outcome(outcome: RunOutcome<DistancePayload>) -> Self {
        let mut response = DistanceResponse {
            data_type: "Distance",
            d: None,
            metadata: None,
            reason: None,
            warning: None,
        };
        match outcome {
            RunOutcome::Success { payload, warnings } => {
                response.d = Some(payload.d);
                if !warnings.is_empty() {
                    response.warning = Some(warnings);
                }
            }
            RunOutcome::Failure { error } => {
                response.reason = Some(error.reason());
            }
        }
        response
    }
}

/// Error body for malformed or invalid requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub reason: String,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}
