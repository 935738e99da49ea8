//! Error handling for the director core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Event log transport unreachable; the tick that saw this mutated
    /// nothing, the external driver controls retry cadence
    #[error("Event log unavailable: {0}")]
    LogUnavailable(String),

    /// Control channel delivery failed; never rolls back a committed switch
    #[error("Command publish failed: {0}")]
    PublishFailed(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLx database error
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::LogUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "LOG_UNAVAILABLE",
                msg.clone(),
            ),
            Error::PublishFailed(msg) => (
                StatusCode::BAD_GATEWAY,
                "PUBLISH_FAILED",
                msg.clone(),
            ),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Error::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            Error::Sqlx(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                e.to_string(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
