//! Error types for the HTTP facade

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{ProcessorError, PromptError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook run failed as a whole
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// Prompt store failure
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            // An unreadable workbook is the caller's problem; everything else is ours
            ApiError::Processor(ref err @ ProcessorError::Read { .. }) => (
                StatusCode::BAD_REQUEST,
                "WORKBOOK_UNREADABLE",
                err.to_string(),
            ),
            ApiError::Processor(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROCESSING_FAILED",
                err.to_string(),
            ),
            ApiError::Prompt(ref err @ PromptError::UnknownKey(_)) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_PROMPT", err.to_string())
            }
            ApiError::Prompt(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROMPT_STORE_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
