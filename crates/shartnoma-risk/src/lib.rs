//! Shartnoma Risk Scorer
//!
//! Turns the issue list of a contract into two headline scores (risk and
//! compliance) plus four sub-scores, all in [0, 100] where higher is safer.
//!
//! - **risk**: 100 minus the dampened penalty of every issue
//! - **compliance**: the same over statutory issue types only
//! - **completeness**: weighted share of the required sections present
//! - **clarity**: metadata identification, short sections, vague wording
//! - **balance**: one-sided clauses
//!
//! Scoring is deterministic and independent of issue order.
//!
//! # Examples
//!
//! ```
//! use shartnoma_domain::{ComplianceIssue, IssueType, Severity};
//! use shartnoma_risk::{RiskLevel, RiskScorer};
//!
//! let scorer = RiskScorer::default();
//! let issues = vec![
//!     ComplianceIssue::new(IssueType::MissingMandatorySection, Severity::High, "Javobgarlik", "..."),
//!     ComplianceIssue::new(IssueType::UnlawfulClause, Severity::High, "Penya miqdori", "..."),
//! ];
//!
//! let score = scorer.risk_score(&issues);
//! assert_eq!(score, 40);
//! assert_eq!(RiskLevel::from_score(score), RiskLevel::Medium);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod level;
pub mod recommendations;
pub mod scorer;
pub mod tagging;

pub use config::{RiskConfig, ScoreWeights, SeverityPenalties};
pub use level::RiskLevel;
pub use recommendations::{recommendations, MAX_RECOMMENDATIONS};
pub use scorer::{RiskAssessment, RiskInput, RiskScorer};
pub use tagging::tag_sections;
