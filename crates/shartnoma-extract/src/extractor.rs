//! Text extractor: container dispatch between native text and OCR

use crate::config::OcrConfig;
use crate::doc::DocConverter;
use crate::docx::extract_docx;
use crate::error::ExtractError;
use crate::ocr::OcrEngine;
use crate::pdf::extract_pdf_text;
use crate::rasterize::PdftoppmRasterizer;
use crate::tesseract::TesseractRecognizer;
use shartnoma_domain::traits::PageImage;
use shartnoma_domain::{ContainerKind, Document, ExtractionResult, Stage, Warning, WarningCode};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Share of control characters above which plain text is treated as binary
const MAX_CONTROL_RATIO: f32 = 0.1;

/// Converts document bytes into an [`ExtractionResult`]
///
/// The OCR engine is optional; without one, scanned PDFs fall back to whatever
/// their text layer holds and images are rejected.
pub struct TextExtractor {
    config: OcrConfig,
    ocr: Option<OcrEngine>,
    doc: DocConverter,
}

impl TextExtractor {
    /// Native-text-only extractor
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            ocr: None,
            doc: DocConverter::new(),
        }
    }

    /// Convert legacy `.doc` files with `converter`
    pub fn with_doc_converter(mut self, converter: DocConverter) -> Self {
        self.doc = converter;
        self
    }

    /// Attach an OCR engine for scanned documents
    pub fn with_ocr(mut self, engine: OcrEngine) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Extractor wired to the system `tesseract` and `pdftoppm` executables
    ///
    /// The secondary recognizer is tesseract in uniform-block mode.
    pub fn system(config: OcrConfig) -> Self {
        let preprocessing = config.page_preprocessing();
        let engine = OcrEngine::new(
            config.clone(),
            Arc::new(TesseractRecognizer::new().with_preprocessing(preprocessing)),
            Arc::new(PdftoppmRasterizer::new()),
        )
        .with_secondary(Arc::new(
            TesseractRecognizer::new().with_psm(6).with_preprocessing(preprocessing),
        ));
        Self::new(config).with_ocr(engine)
    }

    /// Extract the text of one document
    ///
    /// Fails only with `UnsupportedFormat`, `CorruptDocument` or, when no page of a
    /// scan could be rasterized, `Ocr`. A blank result is returned as is.
    pub async fn extract(&self, document: &Document) -> Result<ExtractionResult, ExtractError> {
        let started = Instant::now();
        debug!("Extracting {} ({} bytes, {})", document.id, document.size(), document.kind.as_str());

        let result = match document.kind {
            ContainerKind::PlainText => {
                let text = decode_plain_text(&document.bytes)?;
                ExtractionResult::from_pages(vec![text], elapsed_ms(started))
            }
            ContainerKind::Docx => {
                let docx = extract_docx(&document.bytes)?;
                let mut result = ExtractionResult::from_pages(vec![docx.text], elapsed_ms(started));
                result.page_count = document.page_count.or(docx.page_count).unwrap_or(1);
                self.check_density(&mut result);
                result
            }
            ContainerKind::Doc => {
                let text = self.doc.convert(&document.bytes).await?;
                let mut result = ExtractionResult::from_pages(vec![text], elapsed_ms(started));
                result.page_count = document.page_count.unwrap_or(1);
                self.check_density(&mut result);
                result
            }
            ContainerKind::Pdf => self.extract_pdf(document, started).await?,
            ContainerKind::Image => {
                if !is_known_image(&document.bytes) {
                    return Err(ExtractError::CorruptDocument(
                        "Image signature not recognized".to_string(),
                    ));
                }
                let Some(ocr) = &self.ocr else {
                    return Err(ExtractError::UnsupportedFormat(
                        "Images require an OCR engine".to_string(),
                    ));
                };
                ocr.recognize_images(vec![PageImage {
                    page: 1,
                    data: document.bytes.clone(),
                }])
                .await?
            }
        };

        info!(
            "Extracted {} chars from {} pages (scanned: {}) in {:?}",
            result.visible_chars(),
            result.page_count,
            result.is_scanned,
            started.elapsed()
        );
        Ok(result)
    }

    /// Warn when a word-processing text layer is too thin for its page count
    fn check_density(&self, result: &mut ExtractionResult) {
        let density = result.visible_chars() / result.page_count.max(1);
        if result.is_blank() || density >= self.config.min_chars_per_page {
            return;
        }
        warn!(
            "Text layer holds {} chars/page, below {}",
            density, self.config.min_chars_per_page
        );
        result.warnings.push(Warning::new(
            Stage::Extraction,
            WarningCode::SparseText,
            format!(
                "Only {} characters per page over {} pages; content may be in images",
                density, result.page_count
            ),
        ));
    }

    async fn extract_pdf(&self, document: &Document, started: Instant) -> Result<ExtractionResult, ExtractError> {
        let native = extract_pdf_text(&document.bytes)?;
        let page_count = native.page_count();

        if native.density() >= self.config.min_chars_per_page {
            debug!("PDF text layer is dense enough ({} chars/page)", native.density());
            return Ok(ExtractionResult::from_pages(native.pages, elapsed_ms(started)));
        }

        match &self.ocr {
            Some(ocr) => {
                info!(
                    "PDF text layer too sparse ({} chars/page), running OCR on {} pages",
                    native.density(),
                    page_count
                );
                ocr.recognize_pdf(&document.bytes, page_count).await
            }
            None => {
                warn!("PDF looks scanned but no OCR engine is configured");
                let mut result = ExtractionResult::from_pages(native.pages, elapsed_ms(started));
                result.warnings.push(Warning::new(
                    Stage::Ocr,
                    WarningCode::StageSkipped,
                    "Scanned PDF: OCR engine not configured, text layer used as is",
                ));
                Ok(result)
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Decode UTF-8 text, rejecting binary payloads
fn decode_plain_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ExtractError::CorruptDocument(format!("Text is not valid UTF-8: {}", e)))?;

    let total = text.chars().count();
    if total > 0 {
        let control = text
            .chars()
            .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\u{000C}'))
            .count();
        if control as f32 / total as f32 > MAX_CONTROL_RATIO {
            return Err(ExtractError::CorruptDocument(format!(
                "Text contains {} control characters out of {}",
                control, total
            )));
        }
    }
    Ok(text.replace("\r\n", "\n"))
}

/// Signature check for the raster formats the recognizers accept
fn is_known_image(bytes: &[u8]) -> bool {
    bytes.starts_with(b"\x89PNG\r\n\x1a\n")
        || bytes.starts_with(b"\xFF\xD8\xFF")
        || bytes.starts_with(b"II*\x00")
        || bytes.starts_with(b"MM\x00*")
        || bytes.starts_with(b"BM")
        || bytes.starts_with(b"GIF8")
        || (bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP")
}
