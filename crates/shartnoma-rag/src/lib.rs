//! Shartnoma Legal Review
//!
//! Retrieval-augmented review of contract sections by a generative model.
//!
//! # Overview
//!
//! For every eligible section the orchestrator looks up the closest statutory
//! passages in the vector store, builds a prompt with the section text, the
//! passages and a strict JSON schema, calls the model and validates the answer.
//!
//! # Architecture
//!
//! ```text
//! Section → PassageRetriever → PromptBuilder → LlmProvider → parser → [ComplianceIssue]
//! ```
//!
//! # Failure handling
//!
//! - every collaborator call has a timeout
//! - timeouts and transient model errors are retried with exponential backoff
//! - malformed entries of an answer are dropped, the valid ones are kept
//! - a section whose review fails contributes a warning and no issues
//!
//! # Example Usage
//!
//! ```no_run
//! use shartnoma_domain::{ContractType, Language, SectionLabel};
//! use shartnoma_llm::MockProvider;
//! use shartnoma_rag::{RagConfig, RagOrchestrator, SectionAnalyzer, SectionRequest};
//! use shartnoma_store::embedding::HashingEmbeddingModel;
//! use shartnoma_store::LawCorpus;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let corpus = LawCorpus::from_articles(Vec::new(), HashingEmbeddingModel::new(256))?;
//! let orchestrator = RagOrchestrator::new(MockProvider::default(), corpus, RagConfig::default())?;
//!
//! let review = orchestrator
//!     .analyze(SectionRequest {
//!         index: 3,
//!         label: SectionLabel::Liability,
//!         text: "Penya shartnoma summasining 60% miqdorida undiriladi".to_string(),
//!         language: Language::UzLatin,
//!         contract_type: ContractType::Service,
//!     })
//!     .await;
//! println!("{} issue(s)", review.issues.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod prompt;


pub use config::RagConfig;
pub use error::RagError;
pub use orchestrator::{RagOrchestrator, SectionAnalyzer, SectionRequest, SectionReview};
pub use parser::{parse_llm_response, ParsedReview};
pub use prompt::{PromptBuilder, ISSUE_SCHEMA};
