//! Analysis module - the final report and its lifecycle

use crate::contract::{ContractMetadata, ContractType};
use crate::document::DocumentId;
use crate::issue::{ComplianceIssue, Severity};
use crate::language::Language;
use crate::section::Section;
use crate::warning::{Warning, WarningCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for one analysis run (UUIDv7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(uuid::Uuid);

impl AnalysisId {
    /// Generate a new identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an analysis
///
/// `Queued → InProgress → {Completed, Failed}`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Waiting for a worker
    Queued,
    /// Pipeline running
    InProgress,
    /// Finished, possibly degraded (see warnings)
    Completed,
    /// No text could be produced, or the run was aborted
    Failed,
}

impl AnalysisStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Queued => "queued",
            AnalysisStatus::InProgress => "in_progress",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    /// Whether no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    /// Whether `self → next` is a legal transition
    pub fn can_transition_to(&self, next: AnalysisStatus) -> bool {
        matches!(
            (self, next),
            (AnalysisStatus::Queued, AnalysisStatus::InProgress)
                | (AnalysisStatus::Queued, AnalysisStatus::Failed)
                | (AnalysisStatus::InProgress, AnalysisStatus::Completed)
                | (AnalysisStatus::InProgress, AnalysisStatus::Failed)
        )
    }
}

/// Illegal lifecycle transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid status transition: {from} -> {to}")]
pub struct TransitionError {
    /// Current state
    pub from: &'static str,
    /// Requested state
    pub to: &'static str,
}

/// Sub-scores behind the two headline scores, all in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Statutory compliance
    pub compliance: u8,
    /// Presence of expected sections
    pub completeness: u8,
    /// Clarity of wording and identification of parties
    pub clarity: u8,
    /// Balance between the parties' rights
    pub balance: u8,
    /// Weighted blend of the four
    pub overall: u8,
}

/// A section with the highest severity of the issues that point at it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedSection {
    /// The section
    pub section: Section,
    /// Highest severity among issues referencing the section
    pub risk: Option<Severity>,
}

/// Final output of the pipeline for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Run identifier
    pub id: AnalysisId,
    /// Analyzed document
    pub document_id: DocumentId,
    /// Lifecycle state
    pub status: AnalysisStatus,
    /// Risk score, 0-100, higher means safer
    pub risk_score: u8,
    /// Compliance score, 0-100, only statutory issues count
    pub compliance_score: u8,
    /// Sub-scores
    pub scores: ScoreBreakdown,
    /// Issues, most severe first
    pub issues: Vec<ComplianceIssue>,
    /// Sections in source order with their risk tag
    pub sections: Vec<TaggedSection>,
    /// Human-readable summary
    pub summary: String,
    /// Recommendations for the reviewer
    pub recommendations: Vec<String>,
    /// Detected (or declared) language
    pub language: Option<Language>,
    /// Detected (or declared) contract type
    pub contract_type: ContractType,
    /// Metadata recovered from the text
    pub metadata: ContractMetadata,
    /// Whether the text came from OCR
    pub is_scanned: bool,
    /// OCR confidence, when OCR ran
    pub ocr_confidence: Option<f32>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Degraded or skipped stages
    pub warnings: Vec<Warning>,
    /// Diagnostic message for failed runs
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Create a queued result
    pub fn queued(document_id: DocumentId) -> Self {
        Self {
            id: AnalysisId::new(),
            document_id,
            status: AnalysisStatus::Queued,
            risk_score: 0,
            compliance_score: 0,
            scores: ScoreBreakdown::default(),
            issues: Vec::new(),
            sections: Vec::new(),
            summary: String::new(),
            recommendations: Vec::new(),
            language: None,
            contract_type: ContractType::Other,
            metadata: ContractMetadata::default(),
            is_scanned: false,
            ocr_confidence: None,
            duration_ms: 0,
            warnings: Vec::new(),
            error: None,
        }
    }

    /// Create a result that is already running
    pub fn started(document_id: DocumentId) -> Self {
        let mut result = Self::queued(document_id);
        result.status = AnalysisStatus::InProgress;
        result
    }

    fn transition(&mut self, next: AnalysisStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Move from `queued` to `in_progress`
    pub fn begin(&mut self) -> Result<(), TransitionError> {
        self.transition(AnalysisStatus::InProgress)
    }

    /// Move to `completed`
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.transition(AnalysisStatus::Completed)
    }

    /// Move to `failed` with a diagnostic message
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(AnalysisStatus::Failed)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Whether any warning carries the given code
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Whether any stage lost content
    pub fn is_degraded(&self) -> bool {
        self.warnings.iter().any(|w| w.code.is_degrading())
    }

    /// Count issues at the given severity
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_happy_path() {
        let mut result = AnalysisResult::queued(DocumentId::new());
        assert_eq!(result.status, AnalysisStatus::Queued);
        result.begin().unwrap();
        assert_eq!(result.status, AnalysisStatus::InProgress);
        result.complete().unwrap();
        assert!(result.status.is_terminal());
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut result = AnalysisResult::started(DocumentId::new());
        result.fail("corrupt").unwrap();
        assert_eq!(result.error.as_deref(), Some("corrupt"));

        assert!(result.complete().is_err());
        assert!(result.fail("again").is_err());
        assert_eq!(result.error.as_deref(), Some("corrupt"));
        assert_eq!(result.status, AnalysisStatus::Failed);
    }

    #[test]
    fn test_cannot_complete_from_queued() {
        let mut result = AnalysisResult::queued(DocumentId::new());
        let err = result.complete().unwrap_err();
        assert_eq!(err.from, "queued");
        assert_eq!(err.to, "completed");
    }
}
