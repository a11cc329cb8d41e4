//! OCR Providers
//!
//! Defines the client trait for asynchronous OCR services and the Azure
//! Computer Vision Read implementation.

use async_trait::async_trait;
use reqwest::{header, StatusCode};

use super::types::{OcrError, PollStatus, ReadOperation};
use crate::config::OcrConfig;

/// Header carrying the Cognitive Services key
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
/// Header naming the URL to poll after a submit
pub const OPERATION_LOCATION_HEADER: &str = "Operation-Location";

/// Client for an OCR service with a submit-then-poll protocol
#[async_trait]
pub trait OcrClient: Send + Sync {
    /// Submit a PDF, optionally restricted to a page range. Returns the
    /// operation location to poll.
    async fn submit(&self, pdf: &[u8], pages: Option<&str>) -> Result<String, OcrError>;

    /// Poll an operation location once
    async fn poll(&self, operation_location: &str) -> Result<PollStatus, OcrError>;
}

/// Azure Computer Vision Read API (v3.2) client
pub struct AzureReadClient {
    client: reqwest::Client,
    analyze_url: String,
    subscription_key: String,
}

impl AzureReadClient {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            analyze_url: config.analyze_url(),
            subscription_key: config.subscription_key.clone(),
        }
    }
}

#[async_trait]
impl OcrClient for AzureReadClient {
    async fn submit(&self, pdf: &[u8], pages: Option<&str>) -> Result<String, OcrError> {
        let mut request = self
            .client
            .post(&self.analyze_url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .header(header::CONTENT_TYPE, "application/pdf")
            .body(pdf.to_vec());

        if let Some(pages) = pages {
            request = request.query(&[("pages", pages)]);
        }

        let response = request.send().await?;
        let status = response.status();

        if status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Service(format!(
                "analyze returned {}: {}",
                status, body
            )));
        }

        let location = response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .ok_or_else(|| {
                OcrError::InvalidResponse("202 response without Operation-Location".to_string())
            })?
            .to_str()
            .map_err(|e| OcrError::InvalidResponse(format!("bad Operation-Location: {}", e)))?;

        Ok(location.to_string())
    }

    async fn poll(&self, operation_location: &str) -> Result<PollStatus, OcrError> {
        let response = self
            .client
            .get(operation_location)
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Service(format!(
                "poll returned {}: {}",
                status, body
            )));
        }

        let operation: ReadOperation = response
            .json()
            .await
            .map_err(|e| OcrError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(operation.into_poll_status())
    }
}
