//! Server error types with HTTP status code mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use icepeak_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Server error type wrapping store errors and providing HTTP status mapping.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Persistence or coordinator failure
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Malformed JSON request body
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic bad request error
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid, or insufficient bearer token
    #[error("{0}")]
    Unauthorized(String),

    /// No value at the requested path
    #[error("{0}")]
    NotFound(String),

    /// Invalid configuration detected at startup
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ServerError {
    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Json(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Store(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a bad request error (400)
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ServerError::BadRequest(msg.into())
    }

    /// Create an unauthorized error (401)
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ServerError::Unauthorized(msg.into())
    }

    /// Create a not found error (404)
    pub fn not_found(msg: impl Into<String>) -> Self {
        ServerError::NotFound(msg.into())
    }
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// HTTP status code
    pub status: u16,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        };
        let json = serde_json::to_string(&body)
            .unwrap_or_else(|_| format!(r#"{{"error":"{}","status":{}}}"#, self, status.as_u16()));

        (status, [("content-type", "application/json")], json).into_response()
    }
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServerError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::unauthorized("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Store(StoreError::Closed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn malformed_body_maps_to_400() {
        let error: ServerError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }
}
