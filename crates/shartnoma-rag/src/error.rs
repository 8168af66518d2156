//! Error types for the legal review stage

use thiserror::Error;

/// Errors that can occur while reviewing one section
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RagError {
    /// Generative model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Vector store error
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// No answer within the request timeout
    #[error("LLM request timed out after {0} attempt(s)")]
    Timeout(u32),

    /// Response does not follow the issue schema
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for RagError {
    fn from(e: serde_json::Error) -> Self {
        RagError::JsonParse(e.to_string())
    }
}

impl RagError {
    /// Whether the model answered but the answer was unusable
    pub fn is_schema_error(&self) -> bool {
        matches!(self, RagError::SchemaViolation(_) | RagError::JsonParse(_))
    }
}
