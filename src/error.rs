//! Error types for the PDF OCR server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::pdf::PdfError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors that reach the request boundary
///
/// Per-job OCR failures never show up here; they are absorbed by the
/// orchestrator and only surface as `NoResults` when every job failed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No file attachment found in a multipart part named 'file'")]
    MissingFile,

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Failed to determine PDF page count")]
    PageCount(#[from] PdfError),

    #[error("No OCR results were produced for any page range")]
    NoResults,

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingFile => "missing_file",
            AppError::UnsupportedContentType(_) => "unsupported_content_type",
            AppError::Multipart(_) => "multipart_error",
            AppError::PageCount(_) => "page_count_error",
            AppError::NoResults => "no_results",
            AppError::InvalidQuery(_) => "invalid_query",
        }
    }

    /// The error followed by its source chain, one cause per line
    pub fn traceback(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.error_code(), self)];
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            lines.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        lines.join("\n")
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub traceback: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let traceback = self.traceback();
        tracing::error!(code = self.error_code(), "Error processing PDF: {}", traceback);

        // Every failure is reported as 500, including input problems
        let body = Json(ErrorResponse {
            error: self.to_string(),
            traceback,
        });

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
