//! Test doubles for the OCR collaborators, plus document fixtures
//!
//! `MockRasterizer` renders page `n` as the bytes of its configured text and
//! `MockRecognizer` reads those bytes back, so a test can describe a scanned
//! document as a list of page strings.

use async_trait::async_trait;
use shartnoma_domain::traits::{
    CollaboratorError, PageImage, PageRasterizer, PageRecognizer, RecognizedPage,
};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Rasterizer whose page images carry the page text as bytes
#[derive(Debug, Clone, Default)]
pub struct MockRasterizer {
    pages: Vec<String>,
    missing: HashSet<usize>,
    fail_all: bool,
    calls: Arc<Mutex<Vec<(usize, usize)>>>,
}

impl MockRasterizer {
    /// Document with the given page texts
    pub fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Leave a page out of the rendered output
    pub fn without_page(mut self, page: usize) -> Self {
        self.missing.insert(page);
        self
    }

    /// Fail every call
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Requested (first, last) ranges, in call order
    pub fn calls(&self) -> Vec<(usize, usize)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageRasterizer for MockRasterizer {
    async fn rasterize(
        &self,
        _pdf: &[u8],
        first: usize,
        last: usize,
        _dpi: u32,
    ) -> Result<Vec<PageImage>, CollaboratorError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((first, last));
        }
        if self.fail_all {
            return Err(CollaboratorError::Failed("mock rasterizer failure".to_string()));
        }
        Ok((first..=last.min(self.pages.len()))
            .filter(|page| !self.missing.contains(page))
            .map(|page| PageImage {
                page,
                data: self.pages[page - 1].clone().into_bytes(),
            })
            .collect())
    }
}

/// Recognizer echoing the image bytes as text
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    name: String,
    confidence: f32,
    overrides: HashMap<usize, Result<RecognizedPage, CollaboratorError>>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<usize>>>,
}

impl MockRecognizer {
    /// Recognizer reporting `confidence` for every page
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
            overrides: HashMap::new(),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fixed result for one page
    pub fn with_page(mut self, page: usize, text: impl Into<String>, confidence: f32) -> Self {
        self.overrides.insert(
            page,
            Ok(RecognizedPage {
                text: text.into(),
                confidence,
            }),
        );
        self
    }

    /// Fail one page
    pub fn failing_page(mut self, page: usize) -> Self {
        self.overrides.insert(
            page,
            Err(CollaboratorError::Failed(format!("mock failure on page {}", page))),
        );
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Pages recognized so far, in call order
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageRecognizer for MockRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn recognize(&self, image: &PageImage, _languages: &str) -> Result<RecognizedPage, CollaboratorError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(image.page);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.overrides.get(&image.page) {
            Some(result) => result.clone(),
            None => Ok(RecognizedPage {
                text: String::from_utf8_lossy(&image.data).to_string(),
                confidence: self.confidence,
            }),
        }
    }
}

/// Minimal DOCX archive with one paragraph per entry
pub fn docx_fixture(paragraphs: &[&str], pages: Option<usize>) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            let escaped = p.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
            format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", escaped)
        })
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut write = |name: &str, content: &str| -> zip::result::ZipResult<()> {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
        Ok(())
    };
    let written = write("word/document.xml", &document).and_then(|_| match pages {
        Some(n) => write(
            "docProps/app.xml",
            &format!("<?xml version=\"1.0\"?><Properties><Pages>{}</Pages></Properties>", n),
        ),
        None => Ok(()),
    });
    if written.is_err() {
        return Vec::new();
    }
    zip.finish().map(Cursor::into_inner).unwrap_or_default()
}

/// PDF with `pages` empty pages (no text layer), as a scanner would produce
pub fn blank_pdf_fixture(pages: u32) -> Vec<u8> {
    use lopdf::{Dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let catalog_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..pages {
        let page_id = doc.new_object_id();
        let content_id = doc.new_object_id();
        doc.objects.insert(
            content_id,
            Object::Stream(Stream::new(Dictionary::new(), Vec::new())),
        );

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ]),
        );
        doc.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(pages as i64));
    pages_dict.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    if doc.save_to(&mut buffer).is_err() {
        return Vec::new();
    }
    buffer
}
