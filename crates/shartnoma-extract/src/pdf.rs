//! Native PDF text layer

use crate::error::ExtractError;
use lopdf::Document;
use tracing::debug;

/// Per-page text of a PDF's text layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    /// Text per page, in page order (empty for pages without a text layer)
    pub pages: Vec<String>,
}

impl PdfText {
    /// Number of pages in the document
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Non-whitespace characters across all pages
    pub fn visible_chars(&self) -> usize {
        self.pages
            .iter()
            .map(|p| p.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }

    /// Average non-whitespace characters per page
    pub fn density(&self) -> usize {
        if self.pages.is_empty() {
            0
        } else {
            self.visible_chars() / self.pages.len()
        }
    }
}

/// Parse the PDF and read every page's text layer
///
/// Fails with `CorruptDocument` when the bytes are not a PDF or it has no pages.
/// A page whose content cannot be decoded yields an empty string.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<PdfText, ExtractError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ExtractError::CorruptDocument(format!("Failed to parse PDF: {}", e)))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(ExtractError::CorruptDocument("PDF has no pages".to_string()));
    }

    let pages = page_numbers
        .iter()
        .map(|&number| match doc.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                debug!("No text layer on page {}: {}", number, e);
                String::new()
            }
        })
        .collect();

    Ok(PdfText { pages })
}
