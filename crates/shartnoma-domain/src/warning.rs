//! Warning module - degraded-stage markers carried by every result

use serde::{Deserialize, Serialize};

/// Stage of the analysis pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Native text extraction
    Extraction,
    /// Rasterization and recognition of scanned pages
    Ocr,
    /// Language and script detection
    LanguageDetection,
    /// Section segmentation and metadata extraction
    Segmentation,
    /// Rule-based compliance checks
    Compliance,
    /// Spellchecking collaborator
    Spelling,
    /// Retrieval-augmented model review
    Rag,
    /// Risk scoring
    Scoring,
    /// Final result assembly
    Assembly,
}

impl Stage {
    /// Get the stage name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extraction => "extraction",
            Stage::Ocr => "ocr",
            Stage::LanguageDetection => "language_detection",
            Stage::Segmentation => "segmentation",
            Stage::Compliance => "compliance",
            Stage::Spelling => "spelling",
            Stage::Rag => "rag",
            Stage::Scoring => "scoring",
            Stage::Assembly => "assembly",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable warning code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    /// Pages beyond the OCR page limit were not processed
    Truncated,
    /// One page could not be recognised
    OcrPageFailure,
    /// Document-level OCR confidence is below the threshold
    LowOcrConfidence,
    /// The secondary recognizer replaced the primary result for a page
    SecondaryOcrUsed,
    /// The generative model or vector store could not be used for a section
    LlmUnavailable,
    /// The model response (or part of it) did not match the schema
    LlmSchemaViolation,
    /// A compliance rule failed to evaluate
    RuleEvaluationError,
    /// The spellchecker could not be reached
    SpellingUnavailable,
    /// The text does not look like a contract
    NotAContract,
    /// The soft duration budget was exceeded
    SoftBudgetExceeded,
    /// Stages were skipped because the hard budget was exhausted
    HardBudgetExceeded,
    /// The run was cancelled between stages
    Cancelled,
    /// A stage was skipped for another reason
    StageSkipped,
    /// A native text layer holds fewer characters per page than expected
    SparseText,
}

impl WarningCode {
    /// Get the code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::Truncated => "truncated",
            WarningCode::OcrPageFailure => "ocr_page_failure",
            WarningCode::LowOcrConfidence => "low_ocr_confidence",
            WarningCode::SecondaryOcrUsed => "secondary_ocr_used",
            WarningCode::LlmUnavailable => "llm_unavailable",
            WarningCode::LlmSchemaViolation => "llm_schema_violation",
            WarningCode::RuleEvaluationError => "rule_evaluation_error",
            WarningCode::SpellingUnavailable => "spelling_unavailable",
            WarningCode::NotAContract => "not_a_contract",
            WarningCode::SoftBudgetExceeded => "soft_budget_exceeded",
            WarningCode::HardBudgetExceeded => "hard_budget_exceeded",
            WarningCode::Cancelled => "cancelled",
            WarningCode::StageSkipped => "stage_skipped",
            WarningCode::SparseText => "sparse_text",
        }
    }

    /// Whether the code means the result lost content (as opposed to a remark)
    pub fn is_degrading(&self) -> bool {
        !matches!(
            self,
            WarningCode::SecondaryOcrUsed | WarningCode::SoftBudgetExceeded | WarningCode::SparseText
        )
    }
}

/// A warning attached to an extraction or analysis result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Stage that raised the warning
    pub stage: Stage,
    /// Machine-readable code
    pub code: WarningCode,
    /// Human-readable detail
    pub message: String,
}

impl Warning {
    /// Create a warning
    pub fn new(stage: Stage, code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            stage,
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.code.as_str(), self.message)
    }
}
