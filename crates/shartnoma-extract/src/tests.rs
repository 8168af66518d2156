//! End-to-end extraction scenarios over mocked collaborators

use crate::mock::{blank_pdf_fixture, docx_fixture, MockRasterizer, MockRecognizer};
use crate::{DocConverter, DocTool, ExtractError, OcrConfig, OcrEngine, TextExtractor};
use shartnoma_domain::{ContainerKind, Document, WarningCode};
use std::sync::Arc;

fn scanned_extractor(config: OcrConfig, pages: usize) -> (TextExtractor, MockRasterizer, MockRecognizer) {
    let rasterizer = MockRasterizer::new((1..=pages).map(|i| format!("{}-sahifa matni", i)));
    let recognizer = MockRecognizer::new("primary", 0.9).with_page(2, "2-sahifa matni", 0.5);
    let engine = OcrEngine::new(
        config.clone(),
        Arc::new(recognizer.clone()),
        Arc::new(rasterizer.clone()),
    );
    (TextExtractor::new(config).with_ocr(engine), rasterizer, recognizer)
}

#[tokio::test]
async fn test_scanned_pdf_with_page_limit() {
    let config = OcrConfig::from_lookup(|key| match key {
        "OCR_PAGES_MAX" => Some("3".to_string()),
        _ => None,
    });
    let (extractor, rasterizer, recognizer) = scanned_extractor(config, 5);
    let document = Document::new(ContainerKind::Pdf, blank_pdf_fixture(5));

    let result = extractor.extract(&document).await.unwrap();

    assert!(result.is_scanned);
    assert_eq!(result.page_count, 5);
    assert_eq!(result.processed_pages(), vec![1, 2, 3]);
    assert!(result.has_warning(WarningCode::Truncated));
    assert!(result.text.contains("3-sahifa"));
    assert!(!result.text.contains("4-sahifa"));
    // (0.9 + 0.5 + 0.9) / 3
    let confidence = result.ocr_confidence.unwrap();
    assert!((confidence - 0.7667).abs() < 1e-3);
    assert_eq!(rasterizer.calls(), vec![(1, 3)]);
    assert_eq!(recognizer.calls().len(), 3);
}

#[tokio::test]
async fn test_scanned_pdf_unlimited() {
    let (extractor, _, _) = scanned_extractor(OcrConfig::default(), 5);
    let document = Document::new(ContainerKind::Pdf, blank_pdf_fixture(5));

    let result = extractor.extract(&document).await.unwrap();
    assert_eq!(result.processed_pages(), vec![1, 2, 3, 4, 5]);
    assert!(!result.has_warning(WarningCode::Truncated));
}

#[tokio::test]
async fn test_scanned_pdf_without_ocr_engine() {
    let extractor = TextExtractor::new(OcrConfig::default());
    let document = Document::new(ContainerKind::Pdf, blank_pdf_fixture(2));

    let result = extractor.extract(&document).await.unwrap();
    assert!(!result.is_scanned);
    assert!(result.is_blank());
    assert!(result.has_warning(WarningCode::StageSkipped));
}

#[tokio::test]
async fn test_garbage_pdf_is_corrupt() {
    let (extractor, _, _) = scanned_extractor(OcrConfig::default(), 1);
    let document = Document::new(ContainerKind::Pdf, vec![0x13, 0x37, 0x00, 0xFF, 0x42]);

    let err = extractor.extract(&document).await.unwrap_err();
    assert!(matches!(err, ExtractError::CorruptDocument(_)));
}

#[tokio::test]
async fn test_docx_native_text() {
    let bytes = docx_fixture(
        &["XIZMAT KO'RSATISH SHARTNOMASI", "1. SHARTNOMA PREDMETI", "Ijrochi xizmat ko'rsatadi."],
        Some(3),
    );
    let extractor = TextExtractor::new(OcrConfig::default());

    let result = extractor
        .extract(&Document::new(ContainerKind::Docx, bytes))
        .await
        .unwrap();

    assert!(!result.is_scanned);
    assert_eq!(result.page_count, 3);
    assert_eq!(result.ocr_confidence, None);
    assert!(result.text.starts_with("XIZMAT KO'RSATISH SHARTNOMASI\n1. SHARTNOMA PREDMETI"));
}

#[tokio::test]
async fn test_sparse_docx_is_flagged() {
    // a cover page and an attachment note over 3 pages
    let bytes = docx_fixture(&["SHARTNOMA", "Ilova: skanerlangan nusxa"], Some(3));
    let extractor = TextExtractor::new(OcrConfig::default());

    let result = extractor
        .extract(&Document::new(ContainerKind::Docx, bytes))
        .await
        .unwrap();

    assert!(result.has_warning(WarningCode::SparseText));
    assert!(!result.is_blank());
}

#[tokio::test]
async fn test_dense_docx_is_not_flagged() {
    let paragraph = "Ijrochi buyurtmachiga shartnomada belgilangan xizmatlarni o'z vaqtida ko'rsatadi.";
    let bytes = docx_fixture(&[paragraph, paragraph], Some(1));
    let extractor = TextExtractor::new(OcrConfig::default());

    let result = extractor
        .extract(&Document::new(ContainerKind::Docx, bytes))
        .await
        .unwrap();

    assert!(!result.has_warning(WarningCode::SparseText));
}

#[tokio::test]
async fn test_doc_without_converter_is_unsupported() {
    let converter = DocConverter::new().with_tools(vec![
        (DocTool::Antiword, "/nonexistent/antiword".to_string()),
        (DocTool::LibreOffice, "/nonexistent/libreoffice".to_string()),
    ]);
    let extractor = TextExtractor::new(OcrConfig::default()).with_doc_converter(converter);
    let mut bytes = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1".to_vec();
    bytes.extend_from_slice(b"legacy");

    let err = extractor
        .extract(&Document::new(ContainerKind::Doc, bytes))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn test_docx_garbage_is_corrupt() {
    let extractor = TextExtractor::new(OcrConfig::default());
    let err = extractor
        .extract(&Document::new(ContainerKind::Docx, b"PK\x03\x04 broken".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::CorruptDocument(_)));
}

#[tokio::test]
async fn test_plain_text() {
    let extractor = TextExtractor::new(OcrConfig::default());
    let result = extractor
        .extract(&Document::new(ContainerKind::PlainText, "ДОГОВОР ПОСТАВКИ".as_bytes().to_vec()))
        .await
        .unwrap();
    assert_eq!(result.text, "ДОГОВОР ПОСТАВКИ");
    assert_eq!(result.page_count, 1);
}

#[tokio::test]
async fn test_image_requires_ocr() {
    let extractor = TextExtractor::new(OcrConfig::default());
    let png = b"\x89PNG\r\n\x1a\nrest".to_vec();
    let err = extractor
        .extract(&Document::new(ContainerKind::Image, png))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn test_image_with_unknown_signature_is_corrupt() {
    let (extractor, _, _) = scanned_extractor(OcrConfig::default(), 1);
    let err = extractor
        .extract(&Document::new(ContainerKind::Image, b"not an image".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::CorruptDocument(_)));
}

#[tokio::test]
async fn test_image_is_recognized() {
    let (extractor, _, _) = scanned_extractor(OcrConfig::default(), 1);
    let png = b"\x89PNG\r\n\x1a\n".to_vec();
    let result = extractor
        .extract(&Document::new(ContainerKind::Image, png))
        .await
        .unwrap();
    assert!(result.is_scanned);
    assert_eq!(result.page_count, 1);
    assert_eq!(result.ocr_confidence, Some(0.9));
}
