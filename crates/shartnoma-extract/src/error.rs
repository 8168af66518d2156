//! Error types for text extraction

use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Container kind this extractor cannot read
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Bytes do not form a readable document of the declared kind
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// No page of a scanned document could be rasterized
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// Filesystem error (scratch files, external tools)
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        ExtractError::Io(e.to_string())
    }
}
