use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

#[derive(Error, Debug)]
pub enum AppError {
    /// Client input rejected before any work was done.
    #[error("{0}")]
    Validation(String),

    /// An image URL could not be downloaded.
    #[error("Failed to download image from {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Downloaded bytes were not a decodable image.
    #[error("Failed to decode image from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// Resize, composition or encoding failed.
    #[error("Image processing failed: {0}")]
    Processing(String),

    /// Operation needs the cache but caching is off.
    #[error("{0}")]
    CacheUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn fetch(url: &str, reason: impl ToString) -> Self {
        AppError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(url: &str, reason: impl ToString) -> Self {
        AppError::Decode {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Processing(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("image task aborted: {}", err))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Fetch { .. }
            | AppError::Decode { .. }
            | AppError::Processing(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}
