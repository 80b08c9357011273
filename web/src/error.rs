//! Error types for web handlers.
//!
//! [`AppError`] bridges action and payload errors to HTTP responses,
//! implementing Axum's `IntoResponse` trait. [`PayloadError`] is the
//! rejection of the form-body extractors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use form_action_core::error::ActionError;
use form_action_runtime::error::StoreError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Application error type for web handlers.
///
/// Only the code and message reach the client; the source is logged for
/// server errors and otherwise dropped.
///
/// # Examples
///
/// ```
/// use axum::http::StatusCode;
/// use form_action_web::AppError;
///
/// let err = AppError::bad_request("Missing boundary");
/// assert_eq!(err.status(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.to_string(), "[BAD_REQUEST] Missing boundary");
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach the underlying error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), "CONFLICT")
    }

    /// Create a 415 Unsupported Media Type error.
    #[must_use]
    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message.into(),
            "UNSUPPORTED_MEDIA_TYPE",
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// The response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Middleware, unhandled handler and type-mismatch failures all surface
/// as a 500; none of them is the submitter's fault.
impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        Self::internal("The form action failed").with_source(anyhow::Error::new(err))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Action(err) => err.into(),
            StoreError::SubmissionInFlight => Self::conflict(err.to_string()),
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Rejection of the form-body and previous-state extractors.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The request declared a content type that is not a form encoding
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The body could not be read
    #[error("Failed to read request body: {0}")]
    Body(String),

    /// The multipart body was malformed
    #[error("Invalid multipart data: {0}")]
    Multipart(String),

    /// The previous-state header was not a valid submission state
    #[error("Invalid previous state: {0}")]
    PreviousState(#[source] serde_json::Error),
}

impl From<PayloadError> for AppError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::UnsupportedContentType(_) => Self::unsupported_media_type(err.to_string()),
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl IntoResponse for PayloadError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "rejected form payload");
        AppError::from(self).into_response()
    }
}
