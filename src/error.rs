//! Error taxonomy for the HTTP boundary.
//!
//! Only two failure classes cross the service boundary: client input errors
//! (400, descriptive message) and processing errors (500, generic message —
//! the cause is logged server-side only). Everything else (metadata
//! extraction, temp-file cleanup) is absorbed and logged where it happens.
//!
//! All error responses share one JSON shape: `{"error": "<message>"}`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, error::ResponseError};
use thiserror::Error;

/// Result type for request handling.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Client input error: missing source, bad field value, fetch failure.
    /// The message is sent to the client verbatim.
    #[error("{0}")]
    BadRequest(String),

    /// Thumbnail decode/resize/encode failed. Deliberately generic — the
    /// underlying cause is logged, never sent to the client.
    #[error("Failed to generate thumbnail")]
    ThumbnailFailed,

    /// Unexpected server-side failure (worker pool, filesystem).
    #[error("Internal server error")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ThumbnailFailed | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}
