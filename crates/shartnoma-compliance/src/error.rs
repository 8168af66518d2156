//! Compliance error types

use thiserror::Error;

/// Errors raised while evaluating a single rule
///
/// The engine never propagates these; a failing rule becomes a low-severity
/// `ambiguous_term` issue and a [`crate::RuleFailure`] entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComplianceError {
    /// A numeric token could not be read
    #[error("Malformed number: {0}")]
    MalformedNumber(String),

    /// A section's offsets do not fit the source text
    #[error("Section out of bounds: {0}")]
    SectionOutOfBounds(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
