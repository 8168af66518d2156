//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline setup error
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] shartnoma_pipeline::PipelineError),

    /// Statute store error
    #[error("Store error: {0}")]
    Store(#[from] shartnoma_store::StoreError),

    /// Model review setup error
    #[error("Review error: {0}")]
    Rag(#[from] shartnoma_rag::RagError),

    /// Text extraction error
    #[error("Extraction error: {0}")]
    Extract(#[from] shartnoma_extract::ExtractError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The analysis ended in the failed state
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
}
