//! OCR Module
//!
//! Text extraction for uploaded PDFs through a remote OCR service.
//!
//! The service works asynchronously: a PDF (or a page range of it) is
//! submitted, the service answers with an operation location, and that
//! location is polled until the analysis succeeds, fails or the poll
//! budget runs out.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pdf_ocr_server::ocr::{AzureReadClient, OcrRequest, OcrServiceConfig, PdfOcrOrchestrator};
//! use pdf_ocr_server::pdf::MupdfPageCounter;
//!
//! let orchestrator = PdfOcrOrchestrator::new(
//!     OcrServiceConfig::from(&config.ocr),
//!     Arc::new(AzureReadClient::new(&config.ocr)),
//!     Arc::new(MupdfPageCounter::new()),
//! );
//!
//! let outcome = orchestrator.process(&OcrRequest::new(pdf_bytes)).await?;
//! println!("{}", outcome.labeled_text());
//! ```

mod provider;
mod service;
mod types;

pub use provider::{AzureReadClient, OcrClient, OPERATION_LOCATION_HEADER, SUBSCRIPTION_KEY_HEADER};
pub use service::{
    aggregate, select_page_ranges, OcrServiceConfig, PdfOcrOrchestrator, SIMPLE_FAILURE_TEXT,
};
pub use types::{
    JobOutcome, OcrError, OcrOutcome, OcrRequest, OcrResponse, PageRangeJob, PageResult,
    PollStatus, ReadAnalysis, ReadLine, ReadOperation, ReadPage, SimpleOcrResponse,
};

#[cfg(test)]
pub(crate) use provider::mock;
