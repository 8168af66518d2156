//! Document module - the uploaded artifact and the analysis request around it

use crate::contract::ContractType;
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Unique identifier for a document based on UUIDv7
///
/// UUIDv7 keeps identifiers chronologically sortable, which makes re-runs of the
/// same document easy to spot in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(uuid::Uuid);

impl DocumentId {
    /// Generate a new UUIDv7-based DocumentId
    ///
    /// # Examples
    ///
    /// ```
    /// use shartnoma_domain::DocumentId;
    ///
    /// let a = DocumentId::new();
    /// let b = DocumentId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a DocumentId from its string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid document id: {}", e))
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Container format of an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// PDF, either with a text layer or scanned
    Pdf,
    /// Office Open XML word-processing document
    Docx,
    /// Legacy binary Word document
    Doc,
    /// Raster image (PNG, JPEG, TIFF, ...)
    Image,
    /// Plain UTF-8 text
    PlainText,
}

impl ContainerKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Pdf => "pdf",
            ContainerKind::Docx => "docx",
            ContainerKind::Doc => "doc",
            ContainerKind::Image => "image",
            ContainerKind::PlainText => "text",
        }
    }

    /// Resolve a declared MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_lowercase();
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence {
            "application/pdf" => Some(ContainerKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(ContainerKind::Docx)
            }
            "application/msword" => Some(ContainerKind::Doc),
            "text/plain" => Some(ContainerKind::PlainText),
            m if m.starts_with("image/") => Some(ContainerKind::Image),
            _ => None,
        }
    }

    /// Resolve a file extension (without the dot, any case)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(ContainerKind::Pdf),
            "docx" => Some(ContainerKind::Docx),
            "doc" => Some(ContainerKind::Doc),
            "txt" | "text" => Some(ContainerKind::PlainText),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp" => Some(ContainerKind::Image),
            _ => None,
        }
    }

    /// Resolve the kind from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl std::str::FromStr for ContainerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mime(s)
            .or_else(|| Self::from_extension(s))
            .ok_or_else(|| format!("Unsupported container kind: {}", s))
    }
}

/// One uploaded artifact
///
/// The bytes are owned by the storage collaborator; the pipeline only reads them.
/// A document is immutable once created and may be analyzed any number of times.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document identifier
    pub id: DocumentId,

    /// Declared container kind
    pub kind: ContainerKind,

    /// Raw bytes
    pub bytes: Vec<u8>,

    /// Page count, when the caller already knows it
    pub page_count: Option<usize>,
}

impl Document {
    /// Create a document with a fresh identifier
    pub fn new(kind: ContainerKind, bytes: Vec<u8>) -> Self {
        Self {
            id: DocumentId::new(),
            kind,
            bytes,
            page_count: None,
        }
    }

    /// Use an existing identifier (re-analysis of a stored document)
    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = id;
        self
    }

    /// Size of the raw payload in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Input of one pipeline run: the document plus caller-declared contract metadata
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// The document to analyze
    pub document: Document,

    /// Contract title as entered by the user
    pub title: Option<String>,

    /// Declared contract type; detection is used when absent or `Other`
    pub declared_type: Option<ContractType>,

    /// Declared language; detection is used when absent
    pub declared_language: Option<Language>,
}

impl AnalysisRequest {
    /// Create a request with no declared metadata
    pub fn new(document: Document) -> Self {
        Self {
            document,
            title: None,
            declared_type: None,
            declared_language: None,
        }
    }

    /// Set the declared contract type
    pub fn with_type(mut self, contract_type: ContractType) -> Self {
        self.declared_type = Some(contract_type);
        self
    }

    /// Set the declared language
    pub fn with_language(mut self, language: Language) -> Self {
        self.declared_language = Some(language);
        self
    }

    /// Set the contract title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_kind_from_mime() {
        assert_eq!(ContainerKind::from_mime("application/pdf"), Some(ContainerKind::Pdf));
        assert_eq!(
            ContainerKind::from_mime("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            Some(ContainerKind::Docx)
        );
        assert_eq!(ContainerKind::from_mime("image/png"), Some(ContainerKind::Image));
        assert_eq!(ContainerKind::from_mime("text/plain; charset=utf-8"), Some(ContainerKind::PlainText));
        assert_eq!(ContainerKind::from_mime("application/msword"), Some(ContainerKind::Doc));
        assert_eq!(ContainerKind::from_mime("application/zip"), None);
    }

    #[test]
    fn test_container_kind_from_path() {
        assert_eq!(ContainerKind::from_path(Path::new("a/b/contract.PDF")), Some(ContainerKind::Pdf));
        assert_eq!(ContainerKind::from_path(Path::new("scan.jpeg")), Some(ContainerKind::Image));
        assert_eq!(ContainerKind::from_path(Path::new("eski.DOC")), Some(ContainerKind::Doc));
        assert_eq!(ContainerKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_document_id_round_trip() {
        let id = DocumentId::new();
        let parsed = DocumentId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(DocumentId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_reanalysis_keeps_document_id() {
        let stored = DocumentId::new();
        let document = Document::new(ContainerKind::PlainText, b"SHARTNOMA".to_vec()).with_id(stored);
        assert_eq!(document.id, stored);
        assert_eq!(document.size(), 9);
    }
}
