//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the pipeline and the engines it
//! drives: OCR recognizers, the PDF rasterizer, the generative model, the legal
//! passage store and the spellchecking service. Implementations live in other
//! crates; tests use in-memory mocks.

use crate::issue::LawCitation;
use crate::language::Script;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Call did not finish in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Collaborator could not be reached or is not installed
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Collaborator answered with something unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Collaborator reported a failure for this input
    #[error("Failed: {0}")]
    Failed(String),
}

impl CollaboratorError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, CollaboratorError::Timeout(_) | CollaboratorError::Unavailable(_))
    }
}

/// An encoded page image (PNG, JPEG, TIFF ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-based page number in the source document
    pub page: usize,
    /// Encoded image bytes
    pub data: Vec<u8>,
}

/// Text recognised on one page
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedPage {
    /// Recognised text
    pub text: String,
    /// Mean word confidence in [0.0, 1.0]
    pub confidence: f32,
}

/// OCR engine recognising one page at a time
#[async_trait]
pub trait PageRecognizer: Send + Sync {
    /// Engine name for logs and warnings
    fn name(&self) -> &str;

    /// Recognise one page with the given language hint set (e.g. `uzb+uzb_cyrl+rus`)
    async fn recognize(&self, image: &PageImage, languages: &str) -> Result<RecognizedPage, CollaboratorError>;
}

/// Renders PDF pages to images
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Render pages `first..=last` (1-based) at the given resolution
    ///
    /// Pages that could not be rendered are simply absent from the output.
    async fn rasterize(
        &self,
        pdf: &[u8],
        first: usize,
        last: usize,
        dpi: u32,
    ) -> Result<Vec<PageImage>, CollaboratorError>;
}

/// Trait for generative model operations
///
/// Implemented by the infrastructure layer (shartnoma-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Generate text completion
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate output constrained to the given JSON schema (if supported)
    async fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;

    /// Whether the error is worth retrying (transport hiccup rather than refusal)
    fn is_retryable(&self, _error: &Self::Error) -> bool {
        true
    }

    /// Model name for logs
    fn model_name(&self) -> &str {
        "llm"
    }
}

/// A legal passage returned by the vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Law and article the passage comes from
    pub citation: LawCitation,
    /// Article title
    pub title: String,
    /// Article text
    pub content: String,
    /// Cosine similarity to the query
    pub similarity: f32,
}

/// Vector store of statutory passages
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    /// Return up to `top_k` passages ranked by similarity (descending)
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedPassage>, CollaboratorError>;
}

/// One misspelled word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellingSuggestion {
    /// Byte offset of the word in the checked text
    pub offset: usize,
    /// The word as written
    pub word: String,
    /// Suggested corrections, best first
    pub suggestions: Vec<String>,
}

/// Spellchecking service
#[async_trait]
pub trait SpellChecker: Send + Sync {
    /// Check a text written in the given script
    async fn check(&self, text: &str, script: Script) -> Result<Vec<SpellingSuggestion>, CollaboratorError>;
}
