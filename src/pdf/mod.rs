//! PDF acquisition and preparation: download, page removal, and per-page text extraction.

pub mod fetch;
pub mod loader;
pub mod pages;

#[cfg(test)]
pub(crate) mod fixtures;

pub use fetch::{FetchError, PdfFetcher, ensure_pdf_url};
pub use loader::load_documents;
pub use pages::delete_pages;

use thiserror::Error;

/// Errors raised by the PDF library or the extraction worker.
#[derive(Debug, Error)]
pub enum PdfError {
    /// Input bytes could not be parsed as a PDF.
    #[error("Failed to parse PDF: {0}")]
    Parse(String),
    /// A requested page does not exist in the document.
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// Requested 1-based page number.
        page: u32,
        /// Number of pages in the original document.
        page_count: usize,
    },
    /// Serializing the edited document failed.
    #[error("Failed to save PDF: {0}")]
    Save(String),
    /// The transient file used for extraction could not be written.
    #[error("Failed to stage PDF for extraction: {0}")]
    Staging(#[from] std::io::Error),
    /// Text extraction failed.
    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),
    /// The blocking worker running PDF work panicked or was cancelled.
    #[error("PDF worker failed: {0}")]
    Worker(String),
}
