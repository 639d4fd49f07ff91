use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RectifyError {
    #[error("Invalid input image: {0}")]
    InvalidImage(String),

    #[error("Invalid detection parameters: {0}")]
    InvalidParameters(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("No page found in image")]
    PageNotFound,

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to export image: {0}")]
    ExportError(String),

    #[error("Frame source failed: {0}")]
    FrameSource(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RectifyError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            RectifyError::InvalidImage(_) => "INVALID_IMAGE",
            RectifyError::InvalidParameters(_) => "INVALID_PARAMETERS",
            RectifyError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            RectifyError::PageNotFound => "PAGE_NOT_FOUND",
            RectifyError::ImageTooLarge { .. } => "IMAGE_TOO_LARGE",
            RectifyError::MissingFile => "MISSING_FILE",
            RectifyError::InvalidRequest(_) => "INVALID_REQUEST",
            RectifyError::ExportError(_) => "EXPORT_ERROR",
            RectifyError::FrameSource(_) => "FRAME_SOURCE_ERROR",
            RectifyError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RectifyError::InvalidImage(_)
            | RectifyError::InvalidParameters(_)
            | RectifyError::UnsupportedFormat(_)
            | RectifyError::MissingFile
            | RectifyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RectifyError::PageNotFound => StatusCode::UNPROCESSABLE_ENTITY,
            RectifyError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RectifyError::ExportError(_)
            | RectifyError::FrameSource(_)
            | RectifyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for RectifyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}
