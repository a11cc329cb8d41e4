//! OCR Service
//!
//! Orchestrates a PDF OCR request: decides which page ranges to submit,
//! drives the submit/poll cycle for each one and merges the pages back
//! into page order.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::{
    provider::OcrClient,
    types::{JobOutcome, OcrError, OcrOutcome, OcrRequest, PageRangeJob, PageResult, PollStatus},
};
use crate::config::OcrConfig;
use crate::error::AppError;
use crate::pdf::PageCounter;

/// Text returned by the simple endpoint when the OCR job itself failed
pub const SIMPLE_FAILURE_TEXT: &str = "OCR extraction failed.";

/// Polling behaviour for the orchestrator
#[derive(Debug, Clone)]
pub struct OcrServiceConfig {
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub concurrent_jobs: bool,
}

impl Default for OcrServiceConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 60,
            concurrent_jobs: false,
        }
    }
}

impl From<&OcrConfig> for OcrServiceConfig {
    fn from(config: &OcrConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            max_poll_attempts: config.max_poll_attempts,
            concurrent_jobs: config.concurrent_jobs,
        }
    }
}

/// Choose the page ranges to submit
///
/// An explicit expression is submitted as-is. Otherwise short documents
/// go in one range and longer ones are sampled: the first page, then the
/// last two pages as a separate submission.
pub fn select_page_ranges(total_pages: usize, explicit: Option<&str>) -> Vec<PageRangeJob> {
    if let Some(pages) = explicit {
        return vec![PageRangeJob::new(pages)];
    }

    match total_pages {
        0 => Vec::new(),
        1 | 2 => vec![PageRangeJob::new(format!("1-{}", total_pages))],
        n => vec![
            PageRangeJob::new("1"),
            PageRangeJob::new(format!("{}-{}", n - 1, n)),
        ],
    }
}

/// Merge the successful jobs into one outcome sorted by page number
pub fn aggregate(outcomes: Vec<JobOutcome>, total_pages: usize) -> Result<OcrOutcome, AppError> {
    let mut pages: Vec<PageResult> = Vec::new();
    for outcome in outcomes {
        match outcome {
            JobOutcome::Succeeded(results) => pages.extend(results),
            JobOutcome::Failed { job, error } => {
                tracing::debug!(range = job.describe(), %error, "Skipping failed job");
            }
        }
    }

    if pages.is_empty() {
        return Err(AppError::NoResults);
    }

    pages.sort_by_key(|p| p.page);

    Ok(OcrOutcome { pages, total_pages })
}

/// Orchestrator for PDF OCR requests
pub struct PdfOcrOrchestrator {
    config: OcrServiceConfig,
    client: Arc<dyn OcrClient>,
    page_counter: Arc<dyn PageCounter>,
}

impl PdfOcrOrchestrator {
    pub fn new(
        config: OcrServiceConfig,
        client: Arc<dyn OcrClient>,
        page_counter: Arc<dyn PageCounter>,
    ) -> Self {
        Self {
            config,
            client,
            page_counter,
        }
    }

    /// Run OCR for an uploaded PDF and return the ordered page results
    pub async fn process(&self, request: &OcrRequest) -> Result<OcrOutcome, AppError> {
        let total_pages = self.page_counter.page_count(&request.pdf).await?;
        let jobs = select_page_ranges(total_pages, request.pages.as_deref());

        tracing::info!(
            file_name = request.file_name.as_deref().unwrap_or("unknown"),
            size = request.pdf.len(),
            total_pages,
            explicit_pages = request.pages.is_some(),
            jobs = jobs.len(),
            "Starting OCR"
        );

        let outcomes = self.run_jobs(&request.pdf, jobs).await;
        let outcome = aggregate(outcomes, total_pages)?;

        tracing::info!(
            processed_pages = ?outcome.processed_pages(),
            "OCR extraction succeeded"
        );

        Ok(outcome)
    }

    /// OCR the whole document in one job and return its text on one line
    ///
    /// Returns `Ok(None)` when the service reported a failed analysis or
    /// the poll budget ran out. A rejected submit or a broken exchange
    /// with the service is an error.
    pub async fn extract_flat_text(&self, pdf: &[u8]) -> Result<Option<String>, OcrError> {
        let job = PageRangeJob::whole_document();
        let results = match self.submit_and_poll(pdf, &job).await {
            Ok(results) => results,
            Err(error @ (OcrError::Failed | OcrError::Timeout { .. })) => {
                tracing::warn!(range = job.describe(), "OCR job failed: {}", error);
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        let text = results
            .into_iter()
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Some(text.replace('\n', " ").trim().to_string()))
    }

    async fn run_jobs(&self, pdf: &[u8], jobs: Vec<PageRangeJob>) -> Vec<JobOutcome> {
        if self.config.concurrent_jobs {
            return join_all(jobs.into_iter().map(|job| self.run_job(pdf, job))).await;
        }

        let mut outcomes = Vec::with_capacity(jobs.len());
        for job in jobs {
            outcomes.push(self.run_job(pdf, job).await);
        }
        outcomes
    }

    /// Run one job, absorbing its failure into the outcome
    pub async fn run_job(&self, pdf: &[u8], job: PageRangeJob) -> JobOutcome {
        match self.submit_and_poll(pdf, &job).await {
            Ok(results) => {
                tracing::debug!(range = job.describe(), pages = results.len(), "OCR job succeeded");
                JobOutcome::Succeeded(results)
            }
            Err(error) => {
                tracing::warn!(range = job.describe(), "OCR job failed: {}", error);
                JobOutcome::Failed { job, error }
            }
        }
    }

    async fn submit_and_poll(
        &self,
        pdf: &[u8],
        job: &PageRangeJob,
    ) -> Result<Vec<PageResult>, OcrError> {
        let location = self.client.submit(pdf, job.range.as_deref()).await?;
        tracing::debug!(range = job.describe(), %location, "OCR job accepted");

        let max_attempts = self.config.max_poll_attempts;
        for attempt in 1..=max_attempts {
            match self.client.poll(&location).await? {
                PollStatus::Succeeded(analysis) => return Ok(analysis.into_page_results()),
                PollStatus::Failed => return Err(OcrError::Failed),
                PollStatus::InProgress => {
                    tracing::trace!(range = job.describe(), attempt, "OCR job still running");
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.poll_interval).await;
                    }
                }
            }
        }

        Err(OcrError::Timeout {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::provider::mock::{succeeded, MockOcrClient, Script};
    use crate::pdf::FixedPageCounter as FixedPages;

    fn fast_config() -> OcrServiceConfig {
        OcrServiceConfig {
            poll_interval: Duration::ZERO,
            max_poll_attempts: 5,
            concurrent_jobs: false,
        }
    }

    fn orchestrator(client: &Arc<MockOcrClient>, pages: usize) -> PdfOcrOrchestrator {
        PdfOcrOrchestrator::new(fast_config(), client.clone(), Arc::new(FixedPages(pages)))
    }

    fn ranges(jobs: &[PageRangeJob]) -> Vec<&str> {
        jobs.iter().map(|j| j.describe()).collect()
    }

    #[test]
    fn test_short_documents_use_one_range() {
        assert_eq!(ranges(&select_page_ranges(1, None)), vec!["1-1"]);
        assert_eq!(ranges(&select_page_ranges(2, None)), vec!["1-2"]);
    }

    #[test]
    fn test_long_documents_sample_first_and_last_pages() {
        assert_eq!(ranges(&select_page_ranges(3, None)), vec!["1", "2-3"]);
        assert_eq!(ranges(&select_page_ranges(5, None)), vec!["1", "4-5"]);
        assert_eq!(ranges(&select_page_ranges(120, None)), vec!["1", "119-120"]);
    }

    #[test]
    fn test_explicit_range_wins() {
        assert_eq!(ranges(&select_page_ranges(40, Some("3-7"))), vec!["3-7"]);
        assert_eq!(ranges(&select_page_ranges(1, Some("5"))), vec!["5"]);
    }

    #[test]
    fn test_empty_document_has_no_jobs() {
        assert!(select_page_ranges(0, None).is_empty());
    }

    #[test]
    fn test_aggregate_sorts_by_page() {
        let outcomes = vec![
            JobOutcome::Succeeded(vec![PageResult::new(5, "e"), PageResult::new(4, "d")]),
            JobOutcome::Failed {
                job: PageRangeJob::new("2"),
                error: OcrError::Failed,
            },
            JobOutcome::Succeeded(vec![PageResult::new(1, "a")]),
        ];

        let outcome = aggregate(outcomes, 5).unwrap();
        assert_eq!(outcome.processed_pages(), vec![1, 4, 5]);
        assert_eq!(outcome.total_pages, 5);
    }

    #[test]
    fn test_aggregate_without_results_fails() {
        let outcomes = vec![JobOutcome::Failed {
            job: PageRangeJob::new("1"),
            error: OcrError::Timeout { attempts: 60 },
        }];
        assert!(matches!(aggregate(outcomes, 3), Err(AppError::NoResults)));
        assert!(matches!(aggregate(Vec::new(), 0), Err(AppError::NoResults)));
    }

    #[tokio::test]
    async fn test_five_page_document() {
        let client = Arc::new(
            MockOcrClient::new()
                .on(Some("1"), Script::Polls(vec![PollStatus::InProgress, succeeded(&[(1, "Hello")])]))
                .on(Some("4-5"), Script::Polls(vec![succeeded(&[(4, "World"), (5, "End")])])),
        );

        let outcome = orchestrator(&client, 5)
            .process(&OcrRequest::new(b"%PDF".to_vec()))
            .await
            .unwrap();

        assert_eq!(
            client.submitted(),
            vec![Some("1".to_string()), Some("4-5".to_string())]
        );
        assert_eq!(
            outcome.labeled_text(),
            "--- FIRST PAGE ---\nHello\n\n\
             --- LAST PAGES - Page 4 of 5 ---\nWorld\n\n\
             --- LAST PAGES - Page 5 of 5 ---\nEnd"
        );
        assert_eq!(outcome.processed_pages(), vec![1, 4, 5]);
    }

    #[tokio::test]
    async fn test_one_page_document() {
        let client = Arc::new(
            MockOcrClient::new().on(Some("1-1"), Script::Polls(vec![succeeded(&[(1, "Only page")])])),
        );

        let outcome = orchestrator(&client, 1)
            .process(&OcrRequest::new(b"%PDF".to_vec()))
            .await
            .unwrap();

        assert_eq!(client.submitted(), vec![Some("1-1".to_string())]);
        let response = outcome.into_response();
        assert_eq!(response.page_count, 1);
        assert_eq!(response.total_pdf_pages, 1);
        assert_eq!(response.extracted_text, "--- FIRST PAGE ---\nOnly page");
    }

    #[tokio::test]
    async fn test_failed_job_does_not_sink_siblings() {
        let client = Arc::new(
            MockOcrClient::new()
                .on(Some("1"), Script::Reject)
                .on(Some("9-10"), Script::Polls(vec![succeeded(&[(9, "nine"), (10, "ten")])])),
        );

        let outcome = orchestrator(&client, 10)
            .process(&OcrRequest::new(b"%PDF".to_vec()))
            .await
            .unwrap();

        assert_eq!(client.submitted().len(), 2);
        assert_eq!(outcome.processed_pages(), vec![9, 10]);
        assert!(outcome.labeled_text().starts_with("--- LAST PAGES - Page 9 of 10 ---"));
    }

    #[tokio::test]
    async fn test_every_job_failing_is_no_results() {
        let client = Arc::new(
            MockOcrClient::new()
                .on(Some("1"), Script::Polls(vec![PollStatus::Failed]))
                .on(Some("3-4"), Script::Polls(Vec::new())),
        );

        let result = orchestrator(&client, 4)
            .process(&OcrRequest::new(b"%PDF".to_vec()))
            .await;

        assert!(matches!(result, Err(AppError::NoResults)));
    }

    #[tokio::test]
    async fn test_poll_budget_exhaustion_times_out() {
        let client = Arc::new(
            MockOcrClient::new().on(Some("2"), Script::Polls(vec![PollStatus::InProgress; 10])),
        );

        let outcome = orchestrator(&client, 3)
            .run_job(b"%PDF", PageRangeJob::new("2"))
            .await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed {
                error: OcrError::Timeout { attempts: 5 },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_explicit_pages_submit_one_job() {
        let client = Arc::new(
            MockOcrClient::new().on(Some("2-3"), Script::Polls(vec![succeeded(&[(3, "c"), (2, "b")])])),
        );

        let request = OcrRequest::new(b"%PDF".to_vec()).with_pages(Some("2-3".to_string()));
        let outcome = orchestrator(&client, 8).process(&request).await.unwrap();

        assert_eq!(client.submitted(), vec![Some("2-3".to_string())]);
        assert_eq!(outcome.processed_pages(), vec![2, 3]);
        assert_eq!(outcome.total_pages, 8);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_keep_page_order() {
        let client = Arc::new(
            MockOcrClient::new()
                .on(Some("1"), Script::Polls(vec![PollStatus::InProgress, PollStatus::InProgress, succeeded(&[(1, "a")])]))
                .on(Some("6-7"), Script::Polls(vec![succeeded(&[(7, "g"), (6, "f")])])),
        );
        let config = OcrServiceConfig {
            concurrent_jobs: true,
            ..fast_config()
        };
        let orchestrator = PdfOcrOrchestrator::new(config, client.clone(), Arc::new(FixedPages(7)));

        let outcome = orchestrator
            .process(&OcrRequest::new(b"%PDF".to_vec()))
            .await
            .unwrap();

        assert_eq!(outcome.processed_pages(), vec![1, 6, 7]);
    }

    #[tokio::test]
    async fn test_flat_text_for_whole_document() {
        let client = Arc::new(MockOcrClient::new().on(
            None,
            Script::Polls(vec![succeeded(&[(1, " Invoice "), (2, "Total")])]),
        ));

        let text = orchestrator(&client, 2).extract_flat_text(b"%PDF").await.unwrap();

        assert_eq!(client.submitted(), vec![None]);
        assert_eq!(text.as_deref(), Some("Invoice  Total"));
    }

    #[tokio::test]
    async fn test_flat_text_failure_is_none() {
        let client = Arc::new(MockOcrClient::new().on(None, Script::Polls(vec![PollStatus::Failed])));
        let text = orchestrator(&client, 2).extract_flat_text(b"%PDF").await.unwrap();
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_flat_text_timeout_is_none() {
        let client = Arc::new(MockOcrClient::new().on(None, Script::Polls(Vec::new())));
        let text = orchestrator(&client, 2).extract_flat_text(b"%PDF").await.unwrap();
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_flat_text_rejected_submit_is_error() {
        let client = Arc::new(MockOcrClient::new().on(None, Script::Reject));
        let result = orchestrator(&client, 2).extract_flat_text(b"%PDF").await;
        assert!(matches!(result, Err(OcrError::Service(_))));
    }
}
