//! Error types for web handlers.
//!
//! [`AppError`] bridges [`CommerceError`] and HTTP. Every error body has the
//! shape `{ "error": <kind>, "message": <text> }`, where `kind` is the stable
//! kind name of the domain error (`"NotFound"`, `"InsufficientStock"`, ...).

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use growhub_core::CommerceError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Server-class errors are logged with their source and answered with a
/// generic message; the source never reaches the client.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Stable error kind (for client error handling)
    kind: String,
    /// Error message (user-facing)
    message: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, kind, message)
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated", message)
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "ValidationError", message)
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalError", message)
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailable", message)
    }

    /// Map a checkout or reservation failure.
    ///
    /// Business rejections of a transaction request are all `400`, naming the
    /// kind; identity and internal faults keep their usual status.
    #[must_use]
    pub fn rejection(err: CommerceError) -> Self {
        match err {
            CommerceError::Validation(_)
            | CommerceError::NotFound { .. }
            | CommerceError::SelfPurchaseForbidden { .. }
            | CommerceError::InsufficientStock { .. }
            | CommerceError::InsufficientBalance { .. }
            | CommerceError::EventFull { .. } => Self::bad_request(err.kind(), err.to_string()),
            other => Self::from(other),
        }
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable kind name of this error.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
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
    /// Error kind (for client error handling).
    error: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    kind = %self.kind,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    kind = %self.kind,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            error: self.kind,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<CommerceError> for AppError {
    fn from(err: CommerceError) -> Self {
        if matches!(err, CommerceError::Store(_)) {
            return Self::internal("An internal error occurred").with_source(anyhow::Error::new(err));
        }
        let status = match &err {
            CommerceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CommerceError::NotFound { .. } => StatusCode::NOT_FOUND,
            CommerceError::Forbidden(_) | CommerceError::SelfPurchaseForbidden { .. } => {
                StatusCode::FORBIDDEN
            }
            CommerceError::InvalidState { .. } | CommerceError::AlreadyReviewed { .. } => {
                StatusCode::CONFLICT
            }
            CommerceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CommerceError::InsufficientStock { .. }
            | CommerceError::InsufficientBalance { .. }
            | CommerceError::EventFull { .. } => StatusCode::BAD_REQUEST,
            CommerceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}
