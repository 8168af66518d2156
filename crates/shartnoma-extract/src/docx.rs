//! DOCX text extraction
//!
//! A DOCX file is a ZIP archive; the body lives in `word/document.xml` as
//! WordprocessingML. Paragraphs (including those inside table cells) are read in
//! document order. The page count, when Word recorded one, comes from
//! `docProps/app.xml`.

use crate::error::ExtractError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::debug;

/// Text read from a DOCX archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxText {
    /// Body text, one line per paragraph
    pub text: String,
    /// Page count recorded by the authoring application
    pub page_count: Option<usize>,
}

/// Extract body text and page count from DOCX bytes
pub fn extract_docx(bytes: &[u8]) -> Result<DocxText, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::CorruptDocument(format!("DOCX is not a ZIP archive: {}", e)))?;

    let document_xml = read_entry(&mut archive, "word/document.xml")?.ok_or_else(|| {
        ExtractError::CorruptDocument("DOCX has no word/document.xml".to_string())
    })?;
    let text = paragraphs_from_xml(&document_xml)?;

    let page_count = match read_entry(&mut archive, "docProps/app.xml") {
        Ok(Some(app_xml)) => pages_from_app_xml(&app_xml),
        _ => None,
    };

    debug!("DOCX: {} chars, pages {:?}", text.len(), page_count);
    Ok(DocxText { text, page_count })
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ExtractError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(ExtractError::CorruptDocument(format!("Cannot open {}: {}", name, e)));
        }
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| ExtractError::CorruptDocument(format!("Cannot read {}: {}", name, e)))?;
    Ok(Some(content))
}

/// Collect `<w:t>` runs, breaking lines at paragraph ends and `<w:br/>`
fn paragraphs_from_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| {
                    ExtractError::CorruptDocument(format!("Bad text run in document.xml: {}", e))
                })?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::CorruptDocument(format!(
                    "Malformed document.xml at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(out.trim_end().to_string())
}

fn pages_from_app_xml(xml: &str) -> Option<usize> {
    let mut reader = Reader::from_str(xml);
    let mut in_pages = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => in_pages = e.name().as_ref() == b"Pages",
            Ok(Event::Text(t)) if in_pages => {
                return t.unescape().ok().and_then(|v| v.trim().parse().ok());
            }
            Ok(Event::End(_)) => in_pages = false,
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}
