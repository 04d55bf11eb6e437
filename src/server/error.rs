//! Error types and response handling for the sync server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors that can occur while serving counter requests.
#[derive(Debug, Error)]
pub enum ServerError {
    /// CSRF header missing or not matching the cookie
    #[error("CSRF token missing or mismatched")]
    CsrfMismatch,

    /// `count` field absent or not a non-negative integer
    #[error("Invalid count: '{0}'")]
    InvalidCount(String),

    /// Bind address could not be parsed
    #[error("Invalid bind address '{addr}'")]
    InvalidBindAddr { addr: String },

    /// Listener or serve loop failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Map error variant to appropriate HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::CsrfMismatch => StatusCode::FORBIDDEN,
            ServerError::InvalidCount(_) => StatusCode::BAD_REQUEST,
            ServerError::InvalidBindAddr { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error type string for JSON responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::CsrfMismatch => "csrf_mismatch",
            ServerError::InvalidCount(_) => "invalid_count",
            ServerError::InvalidBindAddr { .. } => "invalid_bind_addr",
            ServerError::Io(_) => "io_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "type": self.error_type(),
                "message": self.to_string(),
            }
        });
        (self.status_code(), Json(body)).into_response()
    }
}
