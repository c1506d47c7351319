// ==============================================================================
// handlers.rs - API Request Handlers
// ==============================================================================
// Description: HTTP request handlers for the analysis endpoints
// ==============================================================================

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::info;

use crate::algorithms;
use crate::models::{
    ApiInfoResponse, DistanceRequest, DistanceResponse, ErrorResponse, HealthResponse,
    PcaRequest, PcaResponse, PlsrRequest, PlsrResponse,
};
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Root endpoint - API information
pub async fn root() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "Analytics API Gateway",
        version: "1.0.0",
        endpoints: vec![
            "/health - Health check",
            "/pca - Principal component analysis (POST)",
            "/plsr - Partial least squares regression (POST)",
            "/distance - Sample correlation between two collections (POST)",
        ],
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: "1.0.0",
        timestamp: Utc::now(),
    })
}

/// PCA over one molecular collection.
pub async fn run_pca(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PcaRequest>,
) -> Json<PcaResponse> {
    info!(
        disease = %request.disease,
        collection = %request.molecular_collection,
        genes = request.genes.len(),
        "PCA request"
    );
    let outcome = algorithms::pca::run(state.store(), &request).await;
    Json(PcaResponse::from_outcome(request.disease, outcome))
}

/// PLS regression of clinical features on one molecular collection.
pub async fn run_plsr(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PlsrRequest>,
) -> Json<PlsrResponse> {
    info!(
        disease = %request.disease,
        collection = %request.molecular_collection,
        clinical = %request.clinical_collection,
        features = request.features.len(),
        "PLSR request"
    );
    let outcome = algorithms::plsr::run(state.store(), &request).await;
    Json(PlsrResponse::from_outcome(request.disease, outcome))
}

/// Sample-to-sample correlation between two molecular collections.
pub async fn run_distance(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<DistanceRequest>,
) -> Json<DistanceResponse> {
    info!(
        collection = %request.molecular_collection,
        collection2 = %request.molecular_collection2,
        "Distance request"
    );
    let outcome = algorithms::distance::run(state.store(), &request).await;
    Json(DistanceResponse::from_outcome(outcome))
}

/// Application error type for the HTTP layer. Designed analysis failures are
/// not errors here; they travel inside a 200 response with `reason` set.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { reason })).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = AppError::BadRequest("missing key(s)".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
