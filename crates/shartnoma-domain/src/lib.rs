//! Shartnoma Domain Layer
//!
//! This crate contains the value types and collaborator contracts shared by every
//! stage of the contract analysis pipeline. It holds no processing logic beyond
//! small invariants (severity ordering, state transitions, offset helpers).
//!
//! ## Key Concepts
//!
//! - **Document**: one uploaded artifact (PDF, DOCX, image, plain text)
//! - **ExtractionResult**: plain text with page boundaries, OCR confidence and warnings
//! - **Section**: a labeled contiguous span of the extracted text
//! - **ComplianceIssue**: one detected deviation, with severity and optional citation
//! - **AnalysisResult**: the final report, moving `queued → in_progress → {completed, failed}`
//!
//! ## Architecture
//!
//! ```text
//! Document → ExtractionResult → Language → [Section] → [ComplianceIssue] → AnalysisResult
//! ```
//!
//! Every "kind" string of the source material (section label, issue type, severity,
//! language, contract type) is a closed enum here so that stages match exhaustively.
//! The traits in [`traits`] describe the external collaborators (OCR engines,
//! rasterizer, generative model, vector store, spellchecker).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod contract;
pub mod document;
pub mod extraction;
pub mod issue;
pub mod language;
pub mod section;
pub mod traits;
pub mod warning;

// Re-exports for convenience
pub use analysis::{AnalysisId, AnalysisResult, AnalysisStatus, ScoreBreakdown, TaggedSection, TransitionError};
pub use contract::{ContractMetadata, ContractType, Currency, Party, PartyRole};
pub use document::{AnalysisRequest, ContainerKind, Document, DocumentId};
pub use extraction::{ExtractionResult, PageSpan, PAGE_BREAK};
pub use issue::{ComplianceIssue, IssueSource, IssueType, LawCitation, SectionRef, Severity};
pub use language::{Language, LanguageDetection, Script};
pub use section::{Clause, Section, SectionLabel};
pub use warning::{Stage, Warning, WarningCode};
