//! Page removal on raw PDF buffers.
//!
//! Page numbers are 1-based and always refer to the original document. Deleting `[1, 2]`
//! removes the first two pages, exactly as applying the deletions left to right with a running
//! offset would for ascending input. Survivors are computed in one pass, so unsorted or
//! repeated page numbers are accepted and resolve to the same set of original pages.

use lopdf::Document;

use super::PdfError;

/// Remove `pages` from `pdf` and return the re-saved document.
///
/// Returns the input untouched when `pages` is empty. Fails with
/// [`PdfError::PageOutOfRange`] when a page is `0` or beyond the page count.
pub fn delete_pages(pdf: Vec<u8>, pages: &[u32]) -> Result<Vec<u8>, PdfError> {
    if pages.is_empty() {
        return Ok(pdf);
    }

    let mut document =
        Document::load_mem(&pdf).map_err(|error| PdfError::Parse(error.to_string()))?;
    let page_count = document.get_pages().len();

    let mut targets = pages.to_vec();
    targets.sort_unstable();
    targets.dedup();
    if let Some(&page) = targets
        .iter()
        .find(|&&page| page == 0 || page as usize > page_count)
    {
        return Err(PdfError::PageOutOfRange { page, page_count });
    }

    document.delete_pages(&targets);
    document.prune_objects();

    let mut output = Vec::with_capacity(pdf.len());
    document
        .save_to(&mut output)
        .map_err(|error| PdfError::Save(error.to_string()))?;

    tracing::debug!(
        deleted = ?targets,
        original_pages = page_count,
        remaining_pages = page_count - targets.len(),
        "Removed pages from PDF"
    );
    Ok(output)
}
