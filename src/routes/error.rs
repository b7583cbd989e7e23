use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::lifecycle::{ControlFailureReason, LifecycleError};
use crate::registry::RegistryError;

/// Error returned by handlers; rendered as `{"error": message, "code": CODE}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Registry(RegistryError::NotFound(_))
            | ApiError::Lifecycle(LifecycleError::NotFound(_))
            | ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Lifecycle(LifecycleError::NotRunning(_)) => {
                (StatusCode::BAD_REQUEST, "NOT_RUNNING")
            }
            ApiError::Lifecycle(LifecycleError::ControlFailure { reason, .. }) => match reason {
                ControlFailureReason::Timeout(_) => {
                    (StatusCode::GATEWAY_TIMEOUT, "CONTROL_TIMEOUT")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "CONTROL_FAILURE"),
            },
        };
        let body = json!({
            "error": self.to_string(),
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}
