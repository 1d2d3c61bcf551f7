//! Page-wise PDF text extraction.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while reading text out of a PDF.
#[derive(Debug, Error)]
pub enum PdfExtractError {
    /// Reading the PDF from disk failed.
    #[error("Failed to read PDF: {0}")]
    Io(#[from] std::io::Error),
    /// The extractor rejected the document.
    #[error("Failed to extract PDF text: {0}")]
    Extract(String),
    /// The blocking extraction task panicked or was cancelled.
    #[error("PDF extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Extracts the text of each page of a PDF, in page order.
pub trait PdfTextExtractor: Send + Sync {
    /// Text of every page, first page first.
    fn extract_pages(&self, pdf: &[u8]) -> Result<Vec<String>, PdfExtractError>;
}

/// [`PdfTextExtractor`] built on the `pdf-extract` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractText;

impl PdfTextExtractor for PdfExtractText {
    fn extract_pages(&self, pdf: &[u8]) -> Result<Vec<String>, PdfExtractError> {
        pdf_extract::extract_text_from_mem_by_pages(pdf)
            .map_err(|error| PdfExtractError::Extract(error.to_string()))
    }
}

/// Read the PDF at `path` and concatenate its pages' text without a separator.
///
/// Extraction is CPU-bound and runs on the blocking pool.
pub async fn extract_pdf_text(
    extractor: Arc<dyn PdfTextExtractor>,
    path: &Path,
) -> Result<String, PdfExtractError> {
    let pdf = tokio::fs::read(path).await?;
    let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&pdf)).await??;
    tracing::debug!(pages = pages.len(), "PDF text extracted");
    Ok(pages.concat())
}
