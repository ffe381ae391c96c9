use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::models::search_request::ValidationError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The referenced document is gone; the request cannot be retried as-is.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::SourceUnavailable(msg) => {
                (StatusCode::GONE, "SOURCE_UNAVAILABLE", msg.clone())
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Category of a failed run. Every persisted `error_message` starts with
/// `"<Kind>: "` so the category survives storage as plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    InsufficientContent,
    FetchError,
    ExtractionError,
    SourceUnavailable,
    InternalError,
}

impl FailureKind {
    const ALL: [FailureKind; 5] = [
        FailureKind::InsufficientContent,
        FailureKind::FetchError,
        FailureKind::ExtractionError,
        FailureKind::SourceUnavailable,
        FailureKind::InternalError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InsufficientContent => "InsufficientContent",
            FailureKind::FetchError => "FetchError",
            FailureKind::ExtractionError => "ExtractionError",
            FailureKind::SourceUnavailable => "SourceUnavailable",
            FailureKind::InternalError => "InternalError",
        }
    }

    /// `SourceUnavailable` needs a new request with a fresh upload.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureKind::SourceUnavailable)
    }

    pub fn message(&self, detail: impl fmt::Display) -> String {
        format!("{}: {detail}", self.as_str())
    }

    pub fn from_message(message: &str) -> Option<Self> {
        let (prefix, _) = message.split_once(':')?;
        Self::ALL.into_iter().find(|kind| kind.as_str() == prefix)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
