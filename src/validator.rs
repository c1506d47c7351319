// ==============================================================================
// validator.rs - Request Validation
// ==============================================================================
// Description: Validates request bodies against their variant schema before
//              any data is fetched
// ==============================================================================

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::handlers::AppError;

/// JSON extractor that deserializes against the variant's explicit schema
/// (unknown fields rejected) and then runs the declared field validations.
/// Either failure is a 400 with a `reason` body; handlers only ever see a
/// fully validated request.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate().map_err(|errors| {
            debug!("request failed validation: {errors}");
            AppError::BadRequest(format!("invalid request: {errors}"))
        })?;
        Ok(ValidatedJson(value))
    }
}
