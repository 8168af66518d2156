//! Embedding Model for Text Vectorization
//!
//! Text-to-vector conversion for article retrieval. Embeddings are computed
//! locally so contract text never leaves the machine.
//!
//! # Models
//!
//! - **HashingEmbeddingModel**: token feature hashing. Texts that share word
//!   stems land close together, which is what retrieval over statute text needs.
//!
//! # Examples
//!
//! ```rust
//! use shartnoma_store::embedding::{HashingEmbeddingModel, EmbeddingModel, cosine_similarity};
//!
//! let model = HashingEmbeddingModel::new(384);
//! let a = model.embed("Shartnoma narxi va to'lov tartibi").unwrap();
//! let b = model.embed("To'lov narxi").unwrap();
//! let c = model.embed("Nizolarni hal qilish").unwrap();
//! assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Trait for embedding models
pub trait EmbeddingModel: Send + Sync {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Number of leading characters kept per token
///
/// Uzbek is agglutinative; "shartnomaning" and "shartnomada" share a prefix.
const STEM_CHARS: usize = 7;

/// Feature-hashing embedding model
///
/// Every token is lowercased, stripped of apostrophes, cut to a stem and hashed
/// into one bucket with a hashed sign. The result is L2-normalized.
pub struct HashingEmbeddingModel {
    dimension: usize,
}

impl HashingEmbeddingModel {
    /// Create a model producing vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Split text into normalized stems
    pub fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !(c.is_alphanumeric() || is_apostrophe(c)))
            .map(|raw| {
                raw.chars()
                    .filter(|c| !is_apostrophe(*c))
                    .flat_map(char::to_lowercase)
                    .take(STEM_CHARS)
                    .collect::<String>()
            })
            .filter(|token| token.chars().count() >= 2)
            .collect()
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let hash = hasher.finish();
        let index = (hash % self.dimension as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{02BB}' | '\u{02BC}' | '`')
}

impl EmbeddingModel for HashingEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Text contains no word tokens".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for token in &tokens {
            let (index, sign) = self.bucket(token);
            embedding[index] += sign;
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude == 0.0 {
            return Err(EmbeddingError::InferenceFailed(
                "Token features cancelled out".to_string(),
            ));
        }
        for value in &mut embedding {
            *value /= magnitude;
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity between two vectors, in [-1, 1]
///
/// Returns 0.0 for vectors of different length or zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
