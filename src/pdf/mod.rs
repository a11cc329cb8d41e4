//! PDF page counting
//!
//! The orchestrator only needs to know how many pages an upload has. MuPDF
//! does the parsing; it is CPU-bound and not async, so it runs on the
//! blocking thread pool.

use async_trait::async_trait;
use mupdf::Document;
use thiserror::Error;

/// PDF errors
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    Load(String),
    #[error("PDF reports an invalid page count: {0}")]
    InvalidPageCount(i32),
    #[error("Page counting task failed: {0}")]
    Join(String),
}

impl From<mupdf::Error> for PdfError {
    fn from(e: mupdf::Error) -> Self {
        PdfError::Load(e.to_string())
    }
}

/// Something that can tell how many pages a PDF has
#[async_trait]
pub trait PageCounter: Send + Sync {
    async fn page_count(&self, data: &[u8]) -> Result<usize, PdfError>;
}

/// MuPDF-backed page counter
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfPageCounter;

impl MupdfPageCounter {
    pub fn new() -> Self {
        Self
    }

    fn count_blocking(data: &[u8]) -> Result<usize, PdfError> {
        let doc = Document::from_bytes(data, "application/pdf")?;
        let count = doc.page_count()?;
        usize::try_from(count).map_err(|_| PdfError::InvalidPageCount(count))
    }
}

#[async_trait]
impl PageCounter for MupdfPageCounter {
    async fn page_count(&self, data: &[u8]) -> Result<usize, PdfError> {
        let data_owned = data.to_vec();
        tokio::task::spawn_blocking(move || Self::count_blocking(&data_owned))
            .await
            .map_err(|e| PdfError::Join(e.to_string()))?
    }
}

/// Page counter that ignores the input
#[cfg(test)]
pub(crate) struct FixedPageCounter(pub usize);

#[cfg(test)]
#[async_trait]
impl PageCounter for FixedPageCounter {
    async fn page_count(&self, _data: &[u8]) -> Result<usize, PdfError> {
        Ok(self.0)
    }
}

/// Build a minimal, well-formed PDF with `pages` blank pages
#[cfg(test)]
pub(crate) fn blank_pdf(pages: usize) -> Vec<u8> {
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            (0..pages)
                .map(|i| format!("{} 0 R", i + 3))
                .collect::<Vec<_>>()
                .join(" "),
            pages
        ),
    ];
    for _ in 0..pages {
        objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".to_string());
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}
