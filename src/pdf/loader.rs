//! Per-page text extraction.
//!
//! The extraction library reads from a path, so the buffer is staged in a uniquely named
//! temporary file. The file is owned by the blocking worker and removed when the worker
//! returns, whether extraction succeeded, failed, or panicked.

use std::io::Write;
use std::path::Path;

use serde_json::json;
use tempfile::NamedTempFile;

use super::PdfError;
use crate::document::Document;

/// Extract one [`Document`] per non-blank page, in page order.
///
/// Each document carries `loc.pageNumber` (1-based) and `pdf.totalPages` metadata.
pub async fn load_documents(pdf: Vec<u8>) -> Result<Vec<Document>, PdfError> {
    let pages = tokio::task::spawn_blocking(move || extract_pages(&std::env::temp_dir(), &pdf))
        .await
        .map_err(|error| PdfError::Worker(error.to_string()))??;

    let total_pages = pages.len();
    let documents: Vec<Document> = pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(index, text)| {
            Document::new(text)
                .with_metadata("loc", json!({ "pageNumber": index + 1 }))
                .with_metadata("pdf", json!({ "totalPages": total_pages }))
        })
        .collect();

    tracing::debug!(
        total_pages,
        documents = documents.len(),
        "Extracted text from PDF"
    );
    Ok(documents)
}

fn extract_pages(staging_dir: &Path, pdf: &[u8]) -> Result<Vec<String>, PdfError> {
    let staged = stage(staging_dir, pdf)?;
    tracing::trace!(path = %staged.path().display(), "Staged PDF for extraction");
    pdf_extract::extract_text_by_pages(staged.path())
        .map_err(|error| PdfError::Extraction(error.to_string()))
}

fn stage(staging_dir: &Path, pdf: &[u8]) -> Result<NamedTempFile, PdfError> {
    let mut file = tempfile::Builder::new()
        .prefix("paperchat-")
        .suffix(".pdf")
        .tempfile_in(staging_dir)?;
    file.write_all(pdf)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::build_pdf;

    #[tokio::test]
    async fn one_document_per_page_with_page_metadata() {
        let pdf = build_pdf(&["Hello from page one", "Greetings from page two"]);
        let documents = load_documents(pdf).await.expect("load");

        assert_eq!(documents.len(), 2);
        assert!(documents[0].page_content.contains("page one"));
        assert!(documents[1].page_content.contains("page two"));
        assert_eq!(documents[0].metadata["loc"]["pageNumber"], 1);
        assert_eq!(documents[1].metadata["loc"]["pageNumber"], 2);
        assert_eq!(documents[1].metadata["pdf"]["totalPages"], 2);
    }

    #[tokio::test]
    async fn invalid_pdf_is_an_extraction_error() {
        let error = load_documents(b"definitely not a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            PdfError::Extraction(_) | PdfError::Worker(_)
        ));
    }

    #[test]
    fn staged_file_is_removed_on_drop() {
        let staged = stage(&std::env::temp_dir(), b"%PDF-1.5").expect("stage");
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert!(
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("paperchat-") && name.ends_with(".pdf"))
        );
        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_extraction_leaves_no_staged_file() {
        let staging = tempfile::tempdir().expect("staging dir");
        let dir = staging.path().to_path_buf();

        // The extraction library may either error or panic on garbage; both paths must clean up.
        let outcome =
            tokio::task::spawn_blocking(move || extract_pages(&dir, b"definitely not a pdf")).await;
        assert!(!matches!(outcome, Ok(Ok(_))));

        let leftovers: Vec<_> = std::fs::read_dir(staging.path())
            .expect("read staging dir")
            .collect();
        assert!(leftovers.is_empty(), "staged files left behind: {leftovers:?}");
    }
}
