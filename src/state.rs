//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::ocr::{AzureReadClient, OcrClient, OcrServiceConfig, PdfOcrOrchestrator};
use crate::pdf::{MupdfPageCounter, PageCounter};

/// Shared application state
///
/// Read-only after start-up; handlers only borrow from it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    orchestrator: PdfOcrOrchestrator,
}

impl AppState {
    /// Create the state with the Azure Read client and MuPDF page counter
    pub fn new(config: Config) -> Self {
        let client = Arc::new(AzureReadClient::new(&config.ocr));
        Self::with_collaborators(config, client, Arc::new(MupdfPageCounter::new()))
    }

    /// Create the state with explicit OCR and page-counting collaborators
    pub fn with_collaborators(
        config: Config,
        client: Arc<dyn OcrClient>,
        page_counter: Arc<dyn PageCounter>,
    ) -> Self {
        let orchestrator =
            PdfOcrOrchestrator::new(OcrServiceConfig::from(&config.ocr), client, page_counter);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                orchestrator,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the OCR orchestrator
    pub fn orchestrator(&self) -> &PdfOcrOrchestrator {
        &self.inner.orchestrator
    }
}
