//! OCR Types
//!
//! Request/result model for PDF OCR plus the Read API wire format.

use serde::{Deserialize, Serialize};

/// An uploaded PDF awaiting OCR
#[derive(Debug, Clone)]
pub struct OcrRequest {
    /// Raw PDF bytes
    pub pdf: Vec<u8>,
    /// Explicit page-range expression, e.g. "1-3" or "5"
    pub pages: Option<String>,
    /// Client-supplied file name, if any
    pub file_name: Option<String>,
}

impl OcrRequest {
    pub fn new(pdf: Vec<u8>) -> Self {
        Self {
            pdf,
            pages: None,
            file_name: None,
        }
    }

    /// Set the page-range expression. Blank values count as absent.
    pub fn with_pages(mut self, pages: Option<String>) -> Self {
        self.pages = pages
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self
    }

    pub fn with_file_name(mut self, file_name: Option<String>) -> Self {
        self.file_name = file_name;
        self
    }
}

/// One page range submitted to the OCR service as a single call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRangeJob {
    /// Page-range expression in the service's syntax. `None` submits the
    /// whole document without a page parameter.
    pub range: Option<String>,
}

impl PageRangeJob {
    pub fn new(range: impl Into<String>) -> Self {
        Self {
            range: Some(range.into()),
        }
    }

    pub fn whole_document() -> Self {
        Self { range: None }
    }

    /// Label used in logs
    pub fn describe(&self) -> &str {
        self.range.as_deref().unwrap_or("all")
    }
}

/// Extracted text of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    /// Page number (1-indexed)
    pub page: usize,
    /// Page lines joined with newlines
    pub text: String,
}

impl PageResult {
    pub fn new(page: usize, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// Outcome of one job
#[derive(Debug)]
pub enum JobOutcome {
    Succeeded(Vec<PageResult>),
    Failed { job: PageRangeJob, error: OcrError },
}

/// Aggregated OCR result for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOutcome {
    /// Page results sorted by page number
    pub pages: Vec<PageResult>,
    /// Page count of the source PDF
    pub total_pages: usize,
}

impl OcrOutcome {
    pub fn processed_pages(&self) -> Vec<usize> {
        self.pages.iter().map(|p| p.page).collect()
    }

    /// Label each page and join the blocks with a blank line
    pub fn labeled_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| {
                let label = if p.page == 1 {
                    "FIRST PAGE".to_string()
                } else {
                    format!("LAST PAGES - Page {} of {}", p.page, self.total_pages)
                };
                format!("--- {} ---\n{}", label, p.text)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn into_response(self) -> OcrResponse {
        OcrResponse {
            extracted_text: self.labeled_text(),
            page_count: self.pages.len(),
            total_pdf_pages: self.total_pages,
            processed_pages: self.processed_pages(),
        }
    }
}

/// JSON body of a successful OCR request
#[derive(Debug, Clone, Serialize)]
pub struct OcrResponse {
    pub extracted_text: String,
    pub page_count: usize,
    pub total_pdf_pages: usize,
    pub processed_pages: Vec<usize>,
}

/// JSON body of the simple endpoint, success or failure
#[derive(Debug, Clone, Serialize)]
pub struct SimpleOcrResponse {
    pub extracted_text: String,
}

/// State of an asynchronous Read operation after one poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    /// `notStarted` or `running`
    InProgress,
    Succeeded(ReadAnalysis),
    Failed,
}

/// Read API operation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Body of a Read API `GET` on the operation location
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOperation {
    pub status: OperationStatus,
    #[serde(default)]
    pub analyze_result: Option<ReadAnalysis>,
}

impl ReadOperation {
    pub fn into_poll_status(self) -> PollStatus {
        match (self.status, self.analyze_result) {
            (OperationStatus::Failed, _) => PollStatus::Failed,
            (_, Some(analysis)) => PollStatus::Succeeded(analysis),
            _ => PollStatus::InProgress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadAnalysis {
    #[serde(default)]
    pub read_results: Vec<ReadPage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadPage {
    pub page: usize,
    #[serde(default)]
    pub lines: Vec<ReadLine>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadLine {
    pub text: String,
}

impl ReadAnalysis {
    /// One result per returned page, in the order the service returned them
    pub fn into_page_results(self) -> Vec<PageResult> {
        self.read_results
            .into_iter()
            .map(|page| {
                let text = page
                    .lines
                    .into_iter()
                    .map(|line| line.text)
                    .collect::<Vec<_>>()
                    .join("\n");
                PageResult::new(page.page, text)
            })
            .collect()
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR service rejected the request: {0}")]
    Service(String),

    #[error("OCR operation did not finish after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("OCR service reported a failed analysis")]
    Failed,

    #[error("Malformed OCR service response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
