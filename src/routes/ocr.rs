//! OCR Routes
//!
//! Endpoints:
//! - POST /api/v1/ocr - OCR an uploaded PDF (sampled or explicit page range)
//! - POST /api/v1/ocr/simple - OCR the whole PDF, flattened to one line

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::ocr::{OcrRequest, OcrResponse, SimpleOcrResponse, SIMPLE_FAILURE_TEXT};
use crate::state::AppState;

/// Create the OCR router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(extract_text))
        .route("/simple", post(extract_simple_text))
}

/// Query parameters accepted next to the multipart body
#[derive(Debug, Default, Deserialize)]
pub struct OcrQuery {
    /// Page-range expression; a `pages` form part overrides it
    #[serde(default)]
    pub pages: Option<String>,
}

/// POST /api/v1/ocr
///
/// Multipart fields:
/// - `file`: the PDF (required)
/// - `pages`: page-range expression such as "1-3" (optional)
async fn extract_text(
    State(state): State<AppState>,
    query: std::result::Result<Query<OcrQuery>, QueryRejection>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>> {
    let request_id = Uuid::new_v4();

    async move {
        let Query(query) = query.map_err(|e| AppError::InvalidQuery(e.body_text()))?;
        let multipart = multipart.map_err(|_| unsupported_content_type(&headers))?;
        let mut request = read_upload(multipart).await?;
        if request.pages.is_none() {
            request = request.with_pages(query.pages);
        }

        let outcome = state.orchestrator().process(&request).await?;
        Ok::<_, AppError>(Json(outcome.into_response()))
    }
    .instrument(tracing::info_span!("ocr_request", %request_id))
    .await
}

/// POST /api/v1/ocr/simple
///
/// Submits the whole document as one job. A failed or timed-out analysis
/// still answers 200 with a fixed message; request errors and a rejected
/// or broken exchange with the OCR service answer 500.
async fn extract_simple_text(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    async move {
        let request = match multipart {
            Ok(multipart) => read_upload(multipart).await,
            Err(_) => Err(unsupported_content_type(&headers)),
        };

        let request = match request {
            Ok(request) => request,
            Err(e) => return simple_error_response(e),
        };

        let extracted_text = match state.orchestrator().extract_flat_text(&request.pdf).await {
            Ok(Some(text)) => {
                tracing::info!("OCR extraction succeeded");
                text
            }
            Ok(None) => {
                tracing::error!("OCR extraction failed");
                SIMPLE_FAILURE_TEXT.to_string()
            }
            Err(e) => return simple_error_response(e),
        };

        Json(SimpleOcrResponse { extracted_text }).into_response()
    }
    .instrument(tracing::info_span!("ocr_simple_request", %request_id))
    .await
}

fn simple_error_response(e: impl std::fmt::Display) -> Response {
    tracing::error!("Error processing PDF: {}", e);
    let body = Json(SimpleOcrResponse {
        extracted_text: format!("Error processing PDF: {}", e),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

/// Pull the `file` and `pages` fields out of the multipart body
async fn read_upload(mut multipart: Multipart) -> Result<OcrRequest> {
    let mut pdf: Option<Vec<u8>> = None;
    let mut file_name = None;
    let mut pages = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await?;
                tracing::debug!("Read {} bytes of file data", data.len());
                pdf = Some(data.to_vec());
            }
            "pages" => {
                pages = Some(field.text().await?);
            }
            other => {
                tracing::debug!("Ignoring multipart field '{}'", other);
            }
        }
    }

    let pdf = pdf.filter(|data| !data.is_empty()).ok_or(AppError::MissingFile)?;

    Ok(OcrRequest::new(pdf)
        .with_pages(pages)
        .with_file_name(file_name))
}

fn unsupported_content_type(headers: &HeaderMap) -> AppError {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");
    AppError::UnsupportedContentType(content_type.to_string())
}
