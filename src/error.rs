//! # Error Handling
//!
//! Custom error type for the service and its conversion into HTTP responses.
//!
//! Every error body has the shape `{"error": "<message>"}`. Validation
//! messages are echoed to the caller; protocol and storage failures are
//! logged in full and reported with a generic message so the caller cannot
//! tell which check failed.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Application-wide error type
///
/// The `#[from]` attributes let `?` convert library errors directly, e.g.
/// a failed `sqlx::query(..).execute(..)` becomes [`AppError::Database`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors (SQLx library errors)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// WebAuthn errors raised while *issuing* options.
    ///
    /// Failures while verifying a client response are mapped to
    /// [`AppError::RegistrationRejected`] or [`AppError::AuthenticationRejected`].
    #[error("WebAuthn error: {0}")]
    WebAuthn(#[from] webauthn_rs::prelude::WebauthnError),

    /// JSON serialization/deserialization of stored state
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session store failures
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad or missing field (400, message echoed)
    #[error("{0}")]
    BadRequest(String),

    /// A registration response failed verification (400, generic message)
    #[error("Registration rejected: {0}")]
    RegistrationRejected(String),

    /// A login assertion failed verification (401, generic message)
    #[error("Authentication rejected: {0}")]
    AuthenticationRejected(String),

    /// No authenticated session (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Unexpected failures (500, generic message)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and the message that is safe to show to the caller.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::RegistrationRejected(_) => {
                (StatusCode::BAD_REQUEST, "Registration failed".to_string())
            }
            AppError::AuthenticationRejected(_) => {
                (StatusCode::UNAUTHORIZED, "Authentication failed".to_string())
            }
            AppError::Database(_)
            | AppError::WebAuthn(_)
            | AppError::Serialization(_)
            | AppError::Session(_)
            | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        match &self {
            AppError::RegistrationRejected(detail) | AppError::AuthenticationRejected(detail) => {
                tracing::warn!("{}: {}", error_message, detail);
            }
            AppError::BadRequest(_) | AppError::Unauthorized(_) => {
                tracing::debug!("{}", self);
            }
            _ => tracing::error!("{:?}", self),
        }

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

/// Malformed JSON bodies on typed endpoints are rejected at the boundary as 400s.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_echoed() {
        let (status, message) = AppError::BadRequest("Invalid type".into()).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Invalid type");
    }

    #[test]
    fn protocol_failures_hide_detail() {
        let (status, message) =
            AppError::AuthenticationRejected("sign count regressed".into()).status_and_message();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Authentication failed");

        let (status, message) =
            AppError::RegistrationRejected("challenge expired".into()).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Registration failed");
    }

    #[test]
    fn storage_failures_are_generic_500s() {
        let (status, message) = AppError::Database(sqlx::Error::RowNotFound).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }
}
