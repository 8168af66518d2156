//! Shartnoma Text Extraction
//!
//! Converts uploaded document bytes into plain text with page boundaries.
//!
//! # Architecture
//!
//! - **Native path**: DOCX (WordprocessingML), legacy `.doc` through an external
//!   converter, and PDFs whose text layer is dense enough
//! - **Scanned path**: PDFs with a sparse text layer and raster images go through
//!   the [`OcrEngine`]: chunked rasterization, a bounded pool of page workers,
//!   Cyrillic/Latin look-alike correction and optional secondary recognition
//! - **Collaborators**: recognizers and the rasterizer are traits from
//!   `shartnoma_domain::traits`; [`tesseract`] and [`rasterize`] wrap the system
//!   executables, [`mock`] provides in-memory doubles
//!
//! # Examples
//!
//! ```no_run
//! use shartnoma_domain::{ContainerKind, Document};
//! use shartnoma_extract::{OcrConfig, TextExtractor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = TextExtractor::system(OcrConfig::from_env());
//! let document = Document::new(ContainerKind::Pdf, std::fs::read("contract.pdf")?);
//! let result = extractor.extract(&document).await?;
//! println!("{} pages, scanned: {}", result.page_count, result.is_scanned);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod correction;
pub mod doc;
pub mod docx;
pub mod error;
pub mod extractor;
pub mod mock;
pub mod ocr;
pub mod pdf;
pub mod preprocess;
pub mod rasterize;
pub mod tesseract;

pub use config::OcrConfig;
pub use correction::{correct_lookalikes, Corrected};
pub use doc::{DocConverter, DocTool};
pub use error::ExtractError;
pub use extractor::TextExtractor;
pub use ocr::OcrEngine;
pub use preprocess::Preprocessing;
pub use rasterize::PdftoppmRasterizer;
pub use tesseract::TesseractRecognizer;

#[cfg(test)]
mod tests;
