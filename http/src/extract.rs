use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::HttpError;

/// JSON body that has been deserialized and then checked with `validator`.
///
/// Bodies over the configured limit are rejected with 413. Malformed bodies and failed
/// validation are rejected with 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => HttpError::PayloadTooLarge {
                    message: rejection.body_text(),
                },
                _ => HttpError::Validation {
                    message: rejection.body_text(),
                },
            })?;

        value.validate().map_err(|errors| HttpError::Validation {
            message: errors.to_string(),
        })?;

        Ok(Self(value))
    }
}
