use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::Failure;
use service::{auth::errors::AuthError, errors::ServiceError};
use thiserror::Error;
use tracing::error;

/// Error response for `/api/*` and `/auth/*` handlers:
/// `{"success": false, "error": "..."}` with a matching status.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(Failure::new(self.message))).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let status = match &e {
            ServiceError::UnknownDatabase(_) | ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) | ServiceError::Malformed { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Io { .. } | ServiceError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let status = match &e {
            AuthError::Unauthorized | AuthError::TokenError(_) => StatusCode::UNAUTHORIZED,
            AuthError::HashError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

/// Malformed or mistyped request bodies keep the `Failure` envelope.
impl From<JsonRejection> for JsonApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::UnknownDatabase("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::not_found("record k"), StatusCode::NOT_FOUND),
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::Malformed { path: "a.json".into(), message: "eof".into() },
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Io {
                    path: "a.json".into(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
        assert_eq!(JsonApiError::from(AuthError::Unauthorized).status, StatusCode::UNAUTHORIZED);
    }
}
