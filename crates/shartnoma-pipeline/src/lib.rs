//! Shartnoma Analysis Pipeline
//!
//! Drives one contract analysis from the uploaded bytes to a finished
//! [`AnalysisResult`](shartnoma_domain::AnalysisResult).
//!
//! # Stages
//!
//! 1. **Extraction**: native text, or OCR for scans
//! 2. **Segmentation**: language, sections, metadata and contract type
//! 3. **Compliance**: deterministic legal rules
//! 4. **Spelling**: local rules, then the Uzbek service or LanguageTool for Russian
//! 5. **Model review**: retrieval-augmented review of each eligible section,
//!    run concurrently with stages 3 and 4
//! 6. **Scoring** and **assembly**: scores, recommendations and the summary
//!
//! # Failure handling
//!
//! Errors are classified by stage and kind. Only a document that yields no
//! text, or a run stopped before segmentation, ends `failed`; every other
//! error becomes a warning on a `completed` result.
//!
//! # Example Usage
//!
//! ```no_run
//! use shartnoma_domain::{AnalysisRequest, ContainerKind, Document};
//! use shartnoma_extract::TextExtractor;
//! use shartnoma_pipeline::{Pipeline, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::offline();
//! let pipeline = Pipeline::new(config.clone(), TextExtractor::system(config.ocr.clone()))?;
//!
//! let bytes = std::fs::read("shartnoma.docx")?;
//! let result = pipeline
//!     .analyze(&AnalysisRequest::new(Document::new(ContainerKind::Docx, bytes)))
//!     .await;
//!
//! println!("{}: risk {}/100", result.status.as_str(), result.risk_score);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod budget;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod spelling;
pub mod summary;

pub use budget::{CancelSignal, RunBudget};
pub use config::{PipelineConfig, SpellingConfig, StageToggles};
pub use error::{Disposition, ErrorKind, PipelineError, StageError, StagePolicy, FATAL_ERRORS};
pub use metrics::PipelineMetrics;
pub use pipeline::{merge_issues, Pipeline};
pub use spelling::rules::SpellingRules;
pub use spelling::{spelling_issues, HttpSpellChecker, LanguageToolChecker, MockSpellChecker};
pub use summary::{contract_summary, not_a_contract_summary, NOT_A_CONTRACT_RECOMMENDATIONS};

#[cfg(test)]
mod tests;
