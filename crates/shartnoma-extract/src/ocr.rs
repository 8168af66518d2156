//! OCR Subsystem
//!
//! Turns a scanned PDF (or a single page image) into text.
//!
//! # Flow
//!
//! ```text
//! pages 1..=limit ─► chunks ─► rasterize ─► worker pool (≤ workers) ─► merge by page
//!                                              │
//!                                              ├─ primary recognizer
//!                                              ├─ look-alike correction
//!                                              └─ secondary recognizer if confidence < threshold
//! ```
//!
//! A page that cannot be recognized contributes empty text and zero confidence.
//! The subsystem fails only when no page at all could be rasterized.

use crate::config::OcrConfig;
use crate::correction::correct_lookalikes;
use crate::error::ExtractError;
use shartnoma_domain::traits::{CollaboratorError, PageImage, PageRasterizer, PageRecognizer, RecognizedPage};
use shartnoma_domain::{ExtractionResult, Stage, Warning, WarningCode};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of one page
#[derive(Debug, Clone)]
struct PageOutcome {
    page: usize,
    text: String,
    confidence: f32,
    elapsed_ms: u64,
    failure: Option<String>,
    secondary: Option<String>,
}

impl PageOutcome {
    fn failed(page: usize, reason: impl Into<String>) -> Self {
        Self {
            page,
            text: String::new(),
            confidence: 0.0,
            elapsed_ms: 0,
            failure: Some(reason.into()),
            secondary: None,
        }
    }
}

/// Recognizers and rasterizer shared by the page workers
#[derive(Clone)]
struct Engines {
    primary: Arc<dyn PageRecognizer>,
    secondary: Option<Arc<dyn PageRecognizer>>,
    languages: Arc<str>,
    page_timeout: Duration,
    min_confidence: f32,
}

/// Multi-page OCR with a bounded worker pool
pub struct OcrEngine {
    config: OcrConfig,
    primary: Arc<dyn PageRecognizer>,
    secondary: Option<Arc<dyn PageRecognizer>>,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl OcrEngine {
    /// Create an engine with a primary recognizer and a rasterizer
    pub fn new(
        config: OcrConfig,
        primary: Arc<dyn PageRecognizer>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        Self {
            config,
            primary,
            secondary: None,
            rasterizer,
        }
    }

    /// Register the secondary recognizer
    ///
    /// Used only when `secondary_enabled` is set in the configuration.
    pub fn with_secondary(mut self, secondary: Arc<dyn PageRecognizer>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    fn engines(&self) -> Engines {
        Engines {
            primary: Arc::clone(&self.primary),
            secondary: if self.config.secondary_enabled {
                self.secondary.clone()
            } else {
                None
            },
            languages: Arc::from(self.config.languages.as_str()),
            page_timeout: self.config.page_timeout(),
            min_confidence: self.config.min_confidence,
        }
    }

    /// OCR the first pages of a PDF that has `page_count` pages
    pub async fn recognize_pdf(&self, pdf: &[u8], page_count: usize) -> Result<ExtractionResult, ExtractError> {
        let started = Instant::now();
        let limit = self.config.page_limit(page_count);
        let mut warnings = Vec::new();

        if limit < page_count {
            warn!("OCR limited to {} of {} pages", limit, page_count);
            warnings.push(Warning::new(
                Stage::Ocr,
                WarningCode::Truncated,
                format!("Only pages 1-{} of {} were recognized", limit, page_count),
            ));
        }

        let chunk = if self.config.chunk_size == 0 {
            limit.max(1)
        } else {
            self.config.chunk_size
        };

        let mut outcomes: BTreeMap<usize, PageOutcome> = BTreeMap::new();
        let mut rasterized_any = false;
        let mut rasterizer_unavailable = false;
        let mut last_error = None;

        let mut first = 1;
        while first <= limit {
            let last = (first + chunk - 1).min(limit);
            debug!("Rasterizing pages {}-{} at {} dpi", first, last, self.config.dpi);

            let rendered = tokio::time::timeout(
                self.config.rasterize_timeout(),
                self.rasterizer.rasterize(pdf, first, last, self.config.dpi),
            )
            .await
            .map_err(|_| CollaboratorError::Timeout(format!("rasterizing pages {}-{}", first, last)))
            .and_then(|r| r);

            match rendered {
                Ok(images) => {
                    if !images.is_empty() {
                        rasterized_any = true;
                    }
                    let images: Vec<PageImage> = images
                        .into_iter()
                        .filter(|image| (first..=last).contains(&image.page))
                        .collect();
                    for outcome in self.recognize_batch(images).await {
                        outcomes.insert(outcome.page, outcome);
                    }
                }
                Err(e) => {
                    warn!("Rasterization of pages {}-{} failed: {}", first, last, e);
                    rasterizer_unavailable |= matches!(e, CollaboratorError::Unavailable(_));
                    last_error = Some(e.to_string());
                }
            }

            for page in first..=last {
                outcomes
                    .entry(page)
                    .or_insert_with(|| PageOutcome::failed(page, "page could not be rasterized"));
            }
            first = last + 1;
        }

        if limit > 0 && !rasterized_any {
            let reason = last_error.unwrap_or_else(|| "no page images produced".to_string());
            return Err(if rasterizer_unavailable {
                ExtractError::Ocr(reason)
            } else {
                ExtractError::CorruptDocument(format!("No page could be rasterized: {}", reason))
            });
        }

        let mut result = assemble(outcomes, page_count, warnings, self.config.min_confidence);
        info!(
            "OCR finished: {} pages, confidence {:.2}, {:?}",
            result.pages.len(),
            result.ocr_confidence.unwrap_or(0.0),
            started.elapsed()
        );
        result.is_scanned = true;
        Ok(result)
    }

    /// OCR already-rendered page images (photographs, TIFF scans)
    pub async fn recognize_images(&self, images: Vec<PageImage>) -> Result<ExtractionResult, ExtractError> {
        let page_count = images.len();
        let limit = self.config.page_limit(page_count);
        let mut warnings = Vec::new();
        if limit < page_count {
            warnings.push(Warning::new(
                Stage::Ocr,
                WarningCode::Truncated,
                format!("Only {} of {} images were recognized", limit, page_count),
            ));
        }

        let images: Vec<PageImage> = images.into_iter().take(limit).collect();
        let outcomes = self
            .recognize_batch(images)
            .await
            .into_iter()
            .map(|o| (o.page, o))
            .collect();

        let mut result = assemble(outcomes, page_count, warnings, self.config.min_confidence);
        result.is_scanned = true;
        Ok(result)
    }

    /// Recognize a batch of pages with at most `workers` in flight
    async fn recognize_batch(&self, images: Vec<PageImage>) -> Vec<PageOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let engines = self.engines();
        let mut tasks = JoinSet::new();
        let mut pages = Vec::with_capacity(images.len());

        for image in images {
            pages.push(image.page);
            let semaphore = Arc::clone(&semaphore);
            let engines = engines.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                recognize_page(&engines, image).await
            });
        }

        let mut outcomes = Vec::with_capacity(pages.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("OCR worker crashed: {}", e),
            }
        }

        // Pages whose worker crashed
        for page in pages {
            if !outcomes.iter().any(|o| o.page == page) {
                outcomes.push(PageOutcome::failed(page, "worker crashed"));
            }
        }
        outcomes
    }
}

async fn run_recognizer(
    recognizer: &dyn PageRecognizer,
    image: &PageImage,
    engines: &Engines,
) -> Result<RecognizedPage, CollaboratorError> {
    tokio::time::timeout(engines.page_timeout, recognizer.recognize(image, &engines.languages))
        .await
        .map_err(|_| {
            CollaboratorError::Timeout(format!(
                "{} exceeded {:?} on page {}",
                recognizer.name(),
                engines.page_timeout,
                image.page
            ))
        })?
        .map(|mut page| {
            page.text = correct_lookalikes(&page.text).text;
            page.confidence = page.confidence.clamp(0.0, 1.0);
            page
        })
}

async fn recognize_page(engines: &Engines, image: PageImage) -> PageOutcome {
    let started = Instant::now();
    let page = image.page;

    let primary = run_recognizer(engines.primary.as_ref(), &image, engines).await;

    let needs_secondary = match &primary {
        Ok(p) => p.confidence < engines.min_confidence,
        Err(_) => true,
    };

    let mut secondary_used = None;
    let best = match (&engines.secondary, needs_secondary) {
        (Some(secondary), true) => {
            let second = run_recognizer(secondary.as_ref(), &image, engines).await;
            match (primary, second) {
                (Ok(p), Ok(s)) if s.confidence > p.confidence => {
                    secondary_used = Some(secondary.name().to_string());
                    Ok(s)
                }
                (Ok(p), _) => Ok(p),
                (Err(_), Ok(s)) => {
                    secondary_used = Some(secondary.name().to_string());
                    Ok(s)
                }
                (Err(e), Err(e2)) => {
                    debug!("Secondary recognizer also failed on page {}: {}", page, e2);
                    Err(e)
                }
            }
        }
        _ => primary,
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match best {
        Ok(recognized) => {
            debug!(
                "Page {}: {} chars, confidence {:.2}, {} ms",
                page,
                recognized.text.len(),
                recognized.confidence,
                elapsed_ms
            );
            PageOutcome {
                page,
                text: recognized.text,
                confidence: recognized.confidence,
                elapsed_ms,
                failure: None,
                secondary: secondary_used,
            }
        }
        Err(e) => {
            warn!("Page {} recognition failed: {}", page, e);
            PageOutcome {
                elapsed_ms,
                ..PageOutcome::failed(page, e.to_string())
            }
        }
    }
}

/// Merge page outcomes in page order and compute the document confidence
fn assemble(
    outcomes: BTreeMap<usize, PageOutcome>,
    page_count: usize,
    mut warnings: Vec<Warning>,
    min_confidence: f32,
) -> ExtractionResult {
    let mut result = ExtractionResult::empty();
    result.page_count = page_count;

    for outcome in outcomes.values() {
        if let Some(reason) = &outcome.failure {
            warnings.push(Warning::new(
                Stage::Ocr,
                WarningCode::OcrPageFailure,
                format!("Page {}: {}", outcome.page, reason),
            ));
        }
        if let Some(engine) = &outcome.secondary {
            warnings.push(Warning::new(
                Stage::Ocr,
                WarningCode::SecondaryOcrUsed,
                format!("Page {} re-recognized with {}", outcome.page, engine),
            ));
        }
        result.push_page(
            outcome.page,
            &outcome.text,
            Some(outcome.confidence),
            outcome.elapsed_ms,
        );
    }

    let processed = outcomes.len();
    let confidence = if processed == 0 {
        0.0
    } else {
        outcomes.values().map(|o| o.confidence).sum::<f32>() / processed as f32
    };
    if processed > 0 && confidence < min_confidence {
        warnings.push(Warning::new(
            Stage::Ocr,
            WarningCode::LowOcrConfidence,
            format!("Document OCR confidence {:.2} is below {:.2}", confidence, min_confidence),
        ));
    }

    result.ocr_confidence = Some(confidence);
    result.warnings = warnings;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRasterizer, MockRecognizer};

    fn pages(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("sahifa {}", i)).collect()
    }

    fn engine(config: OcrConfig, recognizer: MockRecognizer, rasterizer: MockRasterizer) -> OcrEngine {
        OcrEngine::new(config, Arc::new(recognizer), Arc::new(rasterizer))
    }

    #[tokio::test]
    async fn test_page_limit_truncates() {
        let config = OcrConfig {
            pages_max: 3,
            ..OcrConfig::default()
        };
        let recognizer = MockRecognizer::new("primary", 0.9).with_page(2, "ikkinchi", 0.6);
        let ocr = engine(config, recognizer.clone(), MockRasterizer::new(pages(5)));

        let result = ocr.recognize_pdf(b"%PDF", 5).await.unwrap();

        assert_eq!(result.processed_pages(), vec![1, 2, 3]);
        assert_eq!(result.page_count, 5);
        assert!(result.has_warning(WarningCode::Truncated));
        assert!(result.text.contains("sahifa 3"));
        assert!(!result.text.contains("sahifa 4"));
        assert!((result.ocr_confidence.unwrap() - 0.8).abs() < 1e-4);
        assert_eq!(recognizer.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_chunked_rasterization() {
        let config = OcrConfig {
            chunk_size: 2,
            ..OcrConfig::default()
        };
        let rasterizer = MockRasterizer::new(pages(5));
        let ocr = engine(config, MockRecognizer::new("primary", 0.9), rasterizer.clone());

        let result = ocr.recognize_pdf(b"%PDF", 5).await.unwrap();

        assert_eq!(rasterizer.calls(), vec![(1, 2), (3, 4), (5, 5)]);
        assert_eq!(result.processed_pages(), vec![1, 2, 3, 4, 5]);
        assert!(!result.has_warning(WarningCode::Truncated));
    }

    #[tokio::test]
    async fn test_page_order_survives_concurrency() {
        let config = OcrConfig {
            workers: 3,
            ..OcrConfig::default()
        };
        let recognizer = MockRecognizer::new("primary", 0.9).with_delay(Duration::from_millis(5));
        let ocr = engine(config, recognizer, MockRasterizer::new(pages(6)));

        let result = ocr.recognize_pdf(b"%PDF", 6).await.unwrap();
        let first = result.text.find("sahifa 1").unwrap();
        let sixth = result.text.find("sahifa 6").unwrap();
        assert!(first < sixth);
        assert_eq!(result.processed_pages(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_failed_page_is_empty_with_zero_confidence() {
        let recognizer = MockRecognizer::new("primary", 0.9).failing_page(2);
        let ocr = engine(OcrConfig::default(), recognizer, MockRasterizer::new(pages(3)));

        let result = ocr.recognize_pdf(b"%PDF", 3).await.unwrap();

        let second = &result.pages[1];
        assert_eq!(second.start, second.end);
        assert_eq!(second.confidence, Some(0.0));
        assert!(result.has_warning(WarningCode::OcrPageFailure));
        assert!((result.ocr_confidence.unwrap() - 0.6).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_missing_raster_page_is_recorded() {
        let rasterizer = MockRasterizer::new(pages(3)).without_page(3);
        let ocr = engine(OcrConfig::default(), MockRecognizer::new("primary", 0.9), rasterizer);

        let result = ocr.recognize_pdf(b"%PDF", 3).await.unwrap();
        assert_eq!(result.processed_pages(), vec![1, 2, 3]);
        assert!(result.has_warning(WarningCode::OcrPageFailure));
    }

    #[tokio::test]
    async fn test_rasterization_failure_everywhere_is_fatal() {
        let ocr = engine(
            OcrConfig::default(),
            MockRecognizer::new("primary", 0.9),
            MockRasterizer::failing(),
        );
        let err = ocr.recognize_pdf(b"%PDF", 2).await.unwrap_err();
        assert!(matches!(err, ExtractError::CorruptDocument(_)));
    }

    #[tokio::test]
    async fn test_secondary_kept_when_better() {
        let config = OcrConfig {
            secondary_enabled: true,
            ..OcrConfig::default()
        };
        let primary = MockRecognizer::new("primary", 0.9).with_page(1, "x", 0.3);
        let secondary = MockRecognizer::new("secondary", 0.8);
        let ocr = OcrEngine::new(config, Arc::new(primary), Arc::new(MockRasterizer::new(pages(2))))
            .with_secondary(Arc::new(secondary.clone()));

        let result = ocr.recognize_pdf(b"%PDF", 2).await.unwrap();

        assert_eq!(secondary.calls(), vec![1]);
        assert!(result.text.starts_with("sahifa 1"));
        assert!(result.has_warning(WarningCode::SecondaryOcrUsed));
        assert!((result.ocr_confidence.unwrap() - 0.85).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_secondary_ignored_when_disabled() {
        let primary = MockRecognizer::new("primary", 0.9).with_page(1, "x", 0.3);
        let secondary = MockRecognizer::new("secondary", 0.8);
        let ocr = OcrEngine::new(
            OcrConfig::default(),
            Arc::new(primary),
            Arc::new(MockRasterizer::new(pages(1))),
        )
        .with_secondary(Arc::new(secondary.clone()));

        let result = ocr.recognize_pdf(b"%PDF", 1).await.unwrap();
        assert!(secondary.calls().is_empty());
        assert_eq!(result.text, "x");
        assert!(result.has_warning(WarningCode::LowOcrConfidence));
    }

    #[tokio::test]
    async fn test_page_timeout_counts_as_failure() {
        let config = OcrConfig {
            page_timeout_secs: 1,
            ..OcrConfig::default()
        };
        let recognizer = MockRecognizer::new("slow", 0.9).with_delay(Duration::from_secs(5));
        let ocr = engine(config, recognizer, MockRasterizer::new(pages(1)));

        let result = ocr.recognize_pdf(b"%PDF", 1).await.unwrap();
        assert!(result.is_blank());
        assert!(result.has_warning(WarningCode::OcrPageFailure));
    }

    #[tokio::test]
    async fn test_correction_applied() {
        let recognizer = MockRecognizer::new("primary", 0.9).with_page(1, "shartn\u{043E}ma", 0.9);
        let ocr = engine(OcrConfig::default(), recognizer, MockRasterizer::new(pages(1)));

        let result = ocr.recognize_pdf(b"%PDF", 1).await.unwrap();
        assert_eq!(result.text, "shartnoma");
    }

    #[tokio::test]
    async fn test_images() {
        let ocr = engine(
            OcrConfig::default(),
            MockRecognizer::new("primary", 0.7),
            MockRasterizer::default(),
        );
        let images = vec![PageImage {
            page: 1,
            data: b"rasm matni".to_vec(),
        }];
        let result = ocr.recognize_images(images).await.unwrap();
        assert_eq!(result.text, "rasm matni");
        assert!(result.is_scanned);
        assert_eq!(result.ocr_confidence, Some(0.7));
    }
}
