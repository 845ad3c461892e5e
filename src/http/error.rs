//! HTTP error taxonomy.
//!
//! Every failure that can reach the client is one of these variants. Each
//! carries a status code and a message; the message is what the client sees,
//! so internal detail belongs in logs, not here.

use axum::http::StatusCode;
use thiserror::Error;

/// An error that short-circuits the request pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    /// A stage did not complete before the watchdog deadline.
    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Server(String),
}

impl HttpError {
    pub fn bad_request() -> Self {
        Self::BadRequest("Bad Request".into())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized".into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Forbidden".into())
    }

    pub fn not_found() -> Self {
        Self::NotFound("Not Found".into())
    }

    pub fn method_not_allowed() -> Self {
        Self::MethodNotAllowed("Method Not Allowed".into())
    }

    pub fn payload_too_large() -> Self {
        Self::PayloadTooLarge("Payload Too Large".into())
    }

    pub fn server() -> Self {
        Self::Server("Internal Server Error".into())
    }

    /// Wrap an unexpected error. The source is logged, not exposed.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "Unexpected server error");
        Self::server()
    }

    /// Numeric status for the response line.
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HttpError::Forbidden(_) => StatusCode::FORBIDDEN,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            HttpError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            HttpError::BadRequest(m)
            | HttpError::Unauthorized(m)
            | HttpError::Forbidden(m)
            | HttpError::NotFound(m)
            | HttpError::MethodNotAllowed(m)
            | HttpError::PayloadTooLarge(m)
            | HttpError::Timeout(m)
            | HttpError::Server(m) => m,
        }
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => HttpError::not_found(),
            std::io::ErrorKind::PermissionDenied => HttpError::forbidden(),
            _ => HttpError::internal(err),
        }
    }
}
