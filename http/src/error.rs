use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use ingest_application::ApplicationError;
use ingest_domain::DomainError;

#[derive(Debug)]
pub enum HttpError {
    Validation { message: String },
    PayloadTooLarge { message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Validation { message } => (StatusCode::UNPROCESSABLE_ENTITY, message),
            HttpError::PayloadTooLarge { message } => (StatusCode::PAYLOAD_TOO_LARGE, message),
            HttpError::ServiceUnavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
            HttpError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (
            status,
            Json(json!({
                "error": message,
            })),
        )
            .into_response()
    }
}

pub fn error_mapper(error: ApplicationError) -> HttpError {
    match error {
        ApplicationError::Validation(message) => HttpError::Validation { message },
        ApplicationError::Domain(DomainError::InvalidInput(message)) => {
            HttpError::Validation { message }
        }
        ApplicationError::Domain(err @ DomainError::ModelNotReady(_)) => {
            HttpError::ServiceUnavailable {
                message: err.to_string(),
            }
        }
        other => HttpError::Internal {
            message: other.to_string(),
        },
    }
}
