//! Extraction module - output of the text extraction / OCR stage

use crate::warning::{Warning, WarningCode};
use serde::{Deserialize, Serialize};

/// Marker inserted between pages of the extracted text
pub const PAGE_BREAK: &str = "\n\u{000C}\n";

/// Byte range of one page inside [`ExtractionResult::text`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpan {
    /// 1-based page number in the source document
    pub page: usize,
    /// Byte offset of the page's first character
    pub start: usize,
    /// Byte offset one past the page's last character
    pub end: usize,
    /// Recognizer confidence for the page (absent for native text)
    pub confidence: Option<f32>,
    /// Time spent on the page in milliseconds
    pub elapsed_ms: u64,
}

/// Plain text extracted from a document
///
/// `text` is never absent: a total failure is an empty string, so downstream
/// stages always have something to work with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted text, pages joined with [`PAGE_BREAK`]
    pub text: String,

    /// Page boundaries, in page order
    pub pages: Vec<PageSpan>,

    /// Total pages in the source document (processed or not)
    pub page_count: usize,

    /// Whether the text came from OCR
    pub is_scanned: bool,

    /// Page-count-weighted mean confidence of processed pages
    pub ocr_confidence: Option<f32>,

    /// Non-fatal problems met during extraction
    pub warnings: Vec<Warning>,
}

impl ExtractionResult {
    /// Result with no text at all
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            pages: Vec::new(),
            page_count: 0,
            is_scanned: false,
            ocr_confidence: None,
            warnings: Vec::new(),
        }
    }

    /// Build a native-text result from per-page strings
    pub fn from_pages(pages: Vec<String>, elapsed_ms: u64) -> Self {
        let page_count = pages.len();
        let per_page = if page_count == 0 { 0 } else { elapsed_ms / page_count as u64 };
        let mut result = Self::empty();
        result.page_count = page_count;
        for (idx, page) in pages.into_iter().enumerate() {
            result.push_page(idx + 1, &page, None, per_page);
        }
        result
    }

    /// Append one page, inserting a page break when needed
    pub fn push_page(&mut self, page: usize, text: &str, confidence: Option<f32>, elapsed_ms: u64) {
        if !self.pages.is_empty() {
            self.text.push_str(PAGE_BREAK);
        }
        let start = self.text.len();
        self.text.push_str(text);
        self.pages.push(PageSpan {
            page,
            start,
            end: self.text.len(),
            confidence,
            elapsed_ms,
        });
    }

    /// Number of characters that are not whitespace
    pub fn visible_chars(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }

    /// Whether the text is empty once whitespace is ignored
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether any warning carries the given code
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Page numbers present in the text
    pub fn processed_pages(&self) -> Vec<usize> {
        self.pages.iter().map(|p| p.page).collect()
    }
}

impl Default for ExtractionResult {
    fn default() -> Self {
        Self::empty()
    }
}
