//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use chatrelay_core::chats::ChatStoreError;
use chatrelay_core::completion::CompletionError;

/// Message returned for every failure that was not raised deliberately.
pub const GENERIC_BAD_REQUEST: &str =
    "The request couldn't be processed. Please check your input and try again.";

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// JSON error body: `{"code": "<type>:<surface>", "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Log an unexpected failure and flatten it to a generic bad request.
    pub fn unexpected(context: &str, err: &dyn std::error::Error) -> Self {
        error!(error = %err, "{context}");
        AppError::BadRequest(GENERIC_BAD_REQUEST.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Client-facing error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request:api",
            AppError::Unauthorized(_) => "unauthorized:chat",
            AppError::Forbidden(_) => "forbidden:chat",
            AppError::NotFound(_) => "not_found:chat",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            AppError::BadRequest(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m) => m,
        };
        let body = Json(ErrorResponse {
            code: code.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

impl From<ChatStoreError> for AppError {
    fn from(e: ChatStoreError) -> Self {
        AppError::unexpected("chat store error", &e)
    }
}

impl From<CompletionError> for AppError {
    fn from(e: CompletionError) -> Self {
        match &e {
            // Provider diagnostics stay in the logs.
            CompletionError::Status { status, body } => {
                error!(status, body = %body, "completion provider rejected request");
                AppError::BadRequest(GENERIC_BAD_REQUEST.into())
            }
            _ => AppError::unexpected("completion request failed", &e),
        }
    }
}
