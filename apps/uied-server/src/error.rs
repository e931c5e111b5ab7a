//! Error types for the UIED server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::detection::{DetectionError, PipelineError};
use crate::resize::DecodeError;
use crate::response::EncodeError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, ApiError>;

/// Application error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No image sent")]
    MissingUpload,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Decode(e) => ApiError::Decode(e),
            PipelineError::Detection(e) => ApiError::Detection(e),
            PipelineError::Task(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::MissingUpload => (StatusCode::BAD_REQUEST, self.to_string()),
            _ => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal Server Error: {}", self),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
