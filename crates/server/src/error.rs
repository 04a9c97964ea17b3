// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use letterscope_core::StorageError;
use serde::Serialize;
use thiserror::Error;

use crate::upload::UploadError;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::JobNotFound(id) => {
                tracing::debug!(job_id = %id, "Job not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Job not found", format!("Job ID: {}", id)),
                )
            }
            ApiError::Upload(upload_err) => match upload_err {
                UploadError::InvalidChunk(msg) => {
                    tracing::warn!(message = %msg, "Invalid chunk");
                    (
                        StatusCode::BAD_REQUEST,
                        ErrorResponse::with_details("Invalid chunk", msg.clone()),
                    )
                }
                UploadError::OutOfOrder { expected, got } => {
                    tracing::warn!(expected, got, "Out-of-order chunk");
                    (
                        StatusCode::CONFLICT,
                        ErrorResponse::with_details("Chunk out of order", upload_err.to_string()),
                    )
                }
                UploadError::Storage(StorageError::InvalidFileName { name }) => {
                    tracing::warn!(file_name = %name, "Rejected file name");
                    (
                        StatusCode::BAD_REQUEST,
                        ErrorResponse::with_details("Invalid file name", upload_err.to_string()),
                    )
                }
                UploadError::Storage(storage_err) => {
                    tracing::error!(error = %storage_err, "Failed to store chunk");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Failed to write chunk"),
                    )
                }
                UploadError::Registry(registry_err) => {
                    tracing::error!(error = %registry_err, "Failed to register job");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Internal server error"),
                    )
                }
            },
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
