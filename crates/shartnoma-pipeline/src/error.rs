//! Error types for pipeline runs and the per-stage error policy

use serde::{Deserialize, Serialize};
use shartnoma_domain::traits::CollaboratorError;
use shartnoma_domain::{Stage, Warning, WarningCode};
use shartnoma_extract::ExtractError;
use thiserror::Error;

/// Errors raised while setting up a pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// What went wrong in a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Container kind cannot be read
    UnsupportedFormat,
    /// Bytes do not form a readable document
    CorruptDocument,
    /// Extraction produced no visible text
    EmptyText,
    /// One OCR page could not be recognised
    OcrPageFailure,
    /// The generative model did not answer in time
    LlmTimeout,
    /// The model answer did not match the schema
    LlmSchemaViolation,
    /// A compliance rule failed to evaluate
    RuleEvaluationError,
    /// An external collaborator could not be reached
    CollaboratorUnavailable,
    /// The caller asked the run to stop
    Cancelled,
    /// The hard duration budget was exhausted
    BudgetExceeded,
}

impl ErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::UnsupportedFormat,
        ErrorKind::CorruptDocument,
        ErrorKind::EmptyText,
        ErrorKind::OcrPageFailure,
        ErrorKind::LlmTimeout,
        ErrorKind::LlmSchemaViolation,
        ErrorKind::RuleEvaluationError,
        ErrorKind::CollaboratorUnavailable,
        ErrorKind::Cancelled,
        ErrorKind::BudgetExceeded,
    ];

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::CorruptDocument => "corrupt_document",
            ErrorKind::EmptyText => "empty_text",
            ErrorKind::OcrPageFailure => "ocr_page_failure",
            ErrorKind::LlmTimeout => "llm_timeout",
            ErrorKind::LlmSchemaViolation => "llm_schema_violation",
            ErrorKind::RuleEvaluationError => "rule_evaluation_error",
            ErrorKind::CollaboratorUnavailable => "collaborator_unavailable",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::BudgetExceeded => "budget_exceeded",
        }
    }
}

/// An error raised by one stage of a run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} failed ({}): {message}", .kind.as_str())]
pub struct StageError {
    /// Stage that failed
    pub stage: Stage,
    /// Error class
    pub kind: ErrorKind,
    /// Diagnostic message
    pub message: String,
}

impl StageError {
    /// Create a stage error
    pub fn new(stage: Stage, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    /// Error for a stage skipped on cancellation
    pub fn cancelled(stage: Stage) -> Self {
        Self::new(stage, ErrorKind::Cancelled, "run cancelled before the stage started")
    }

    /// Error for a stage skipped on an exhausted hard budget
    pub fn over_budget(stage: Stage, elapsed_ms: u128) -> Self {
        Self::new(
            stage,
            ErrorKind::BudgetExceeded,
            format!("hard budget exhausted after {} ms", elapsed_ms),
        )
    }

    /// Classify an extraction failure
    pub fn from_extract(error: ExtractError) -> Self {
        match error {
            ExtractError::UnsupportedFormat(msg) => Self::new(Stage::Extraction, ErrorKind::UnsupportedFormat, msg),
            ExtractError::CorruptDocument(msg) => Self::new(Stage::Extraction, ErrorKind::CorruptDocument, msg),
            ExtractError::Ocr(msg) => Self::new(Stage::Ocr, ErrorKind::CollaboratorUnavailable, msg),
            ExtractError::Io(msg) | ExtractError::Config(msg) => {
                Self::new(Stage::Extraction, ErrorKind::CollaboratorUnavailable, msg)
            }
        }
    }

    /// Classify a collaborator failure met in `stage`
    pub fn from_collaborator(stage: Stage, error: CollaboratorError) -> Self {
        let kind = match (&error, stage) {
            (CollaboratorError::Timeout(_), Stage::Rag) => ErrorKind::LlmTimeout,
            (CollaboratorError::InvalidResponse(_), Stage::Rag) => ErrorKind::LlmSchemaViolation,
            (CollaboratorError::Failed(_), Stage::Ocr) => ErrorKind::OcrPageFailure,
            _ => ErrorKind::CollaboratorUnavailable,
        };
        Self::new(stage, kind, error.to_string())
    }

    /// Warning code reported for a recovered error
    pub fn warning_code(&self) -> WarningCode {
        match self.kind {
            ErrorKind::OcrPageFailure => WarningCode::OcrPageFailure,
            ErrorKind::LlmTimeout => WarningCode::LlmUnavailable,
            ErrorKind::LlmSchemaViolation => WarningCode::LlmSchemaViolation,
            ErrorKind::RuleEvaluationError => WarningCode::RuleEvaluationError,
            ErrorKind::CollaboratorUnavailable => match self.stage {
                Stage::Spelling => WarningCode::SpellingUnavailable,
                Stage::Rag => WarningCode::LlmUnavailable,
                _ => WarningCode::StageSkipped,
            },
            ErrorKind::Cancelled => WarningCode::Cancelled,
            ErrorKind::BudgetExceeded => WarningCode::HardBudgetExceeded,
            ErrorKind::UnsupportedFormat | ErrorKind::CorruptDocument | ErrorKind::EmptyText => {
                WarningCode::StageSkipped
            }
        }
    }

    /// Warning entry for a recovered error
    pub fn to_warning(&self) -> Warning {
        Warning::new(self.stage, self.warning_code(), self.message.clone())
    }
}

/// How the run reacts to a stage error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Abort the run and mark the result failed
    Fatal,
    /// Record a warning and continue with the best partial data
    Recover,
}

/// Fatal `(stage, kind)` pairs; every other pair is recovered
///
/// A run fails only when no text can be produced: the document is unreadable,
/// extraction comes back blank, or the run is stopped before segmentation.
pub const FATAL_ERRORS: &[(Stage, ErrorKind)] = &[
    (Stage::Extraction, ErrorKind::UnsupportedFormat),
    (Stage::Extraction, ErrorKind::CorruptDocument),
    (Stage::Extraction, ErrorKind::EmptyText),
    (Stage::Extraction, ErrorKind::CollaboratorUnavailable),
    (Stage::Extraction, ErrorKind::Cancelled),
    (Stage::Extraction, ErrorKind::BudgetExceeded),
    (Stage::Ocr, ErrorKind::UnsupportedFormat),
    (Stage::Ocr, ErrorKind::CorruptDocument),
    (Stage::Ocr, ErrorKind::EmptyText),
    (Stage::Ocr, ErrorKind::CollaboratorUnavailable),
    (Stage::Segmentation, ErrorKind::Cancelled),
    (Stage::Segmentation, ErrorKind::BudgetExceeded),
];

/// Decides per `(stage, kind)` whether a stage error aborts the run
#[derive(Debug, Clone, Copy, Default)]
pub struct StagePolicy;

impl StagePolicy {
    /// Disposition of an error class raised in a stage
    pub fn decide(&self, stage: Stage, kind: ErrorKind) -> Disposition {
        if FATAL_ERRORS.contains(&(stage, kind)) {
            Disposition::Fatal
        } else {
            Disposition::Recover
        }
    }

    /// Disposition of a stage error
    pub fn disposition(&self, error: &StageError) -> Disposition {
        self.decide(error.stage, error.kind)
    }
}
