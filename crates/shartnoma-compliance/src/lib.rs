//! Shartnoma Compliance Engine
//!
//! Deterministic, rule-based checks of a segmented contract against Uzbek
//! statutes. The engine:
//!
//! - reports every required section that is absent (`missing_mandatory_section`)
//! - evaluates the statutory rule table in [`rules`] (mandatory content,
//!   prohibited waivers, the penalty cap, form requirements)
//! - flags one-sided clauses, vague wording and incomplete metadata
//!
//! Rules are evaluated independently. A rule that fails (malformed number,
//! inconsistent offsets) is downgraded to a low-severity `ambiguous_term` issue
//! and reported in [`ComplianceReport::failures`]; the other rules still run.
//!
//! # Examples
//!
//! ```
//! use shartnoma_compliance::{ComplianceConfig, ComplianceEngine, ComplianceInput};
//! use shartnoma_domain::{ContractMetadata, ContractType, IssueType, Language};
//!
//! let engine = ComplianceEngine::new(ComplianceConfig::default());
//! let metadata = ContractMetadata::default();
//! let input = ComplianceInput {
//!     text: "Salom",
//!     sections: &[],
//!     metadata: &metadata,
//!     contract_type: ContractType::Other,
//!     language: Language::UzLatin,
//!     is_contract: false,
//! };
//!
//! let report = engine.check(&input);
//! assert_eq!(report.issues[0].issue_type, IssueType::Structural);
//! ```

#![warn(missing_docs)]

pub mod checks;
pub mod config;
pub mod engine;
pub mod error;
pub mod rules;

pub use config::{ComplianceConfig, RequiredSections};
pub use engine::{ComplianceEngine, ComplianceInput, ComplianceReport, RuleFailure};
pub use error::ComplianceError;
pub use rules::{LegalRule, RuleCheck, LEGAL_RULES};
