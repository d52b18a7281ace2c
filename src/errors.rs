// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for uploads, analysis and file serving

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Every failure in the service maps to one variant
/// Each variant maps to an HTTP status code and a stable error code
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid file type: {0}. Allowed: mp4, avi, mov, mkv, webm")]
    UnsupportedFormat(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Could not open video: {0}")]
    VideoDecode(String),

    #[error("No frames processed - check video format: {0}")]
    NoFramesProcessed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to render dashboard: {0}")]
    Render(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl DashboardError {
    /// Stable machine-readable code for the error body
    pub fn code(&self) -> &'static str {
        match self {
            DashboardError::InvalidInput(_) => "INVALID_INPUT",
            DashboardError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            DashboardError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            DashboardError::NotFound(_) => "NOT_FOUND",
            DashboardError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            DashboardError::VideoDecode(_) => "VIDEO_DECODE_ERROR",
            DashboardError::NoFramesProcessed(_) => "NO_FRAMES_PROCESSED",
            DashboardError::Storage(_) => "STORAGE_ERROR",
            DashboardError::Render(_) => "RENDER_ERROR",
            DashboardError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Storage(format!("JSON serialization failed: {}", err))
    }
}

impl From<image::ImageError> for DashboardError {
    fn from(err: image::ImageError) -> Self {
        DashboardError::Render(err.to_string())
    }
}

/// Convert DashboardError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for DashboardError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DashboardError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            DashboardError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            DashboardError::VideoDecode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::NoFramesProcessed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
