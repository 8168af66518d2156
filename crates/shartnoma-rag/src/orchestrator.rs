//! Retrieval-augmented review of contract sections

use crate::config::RagConfig;
use crate::error::RagError;
use crate::parser::{parse_llm_response, ParsedReview};
use crate::prompt::{truncate_chars, PromptBuilder, ISSUE_SCHEMA};
use async_trait::async_trait;
use shartnoma_domain::traits::{LlmProvider, PassageRetriever, RetrievedPassage};
use shartnoma_domain::{ComplianceIssue, ContractType, Language, SectionLabel, Stage, Warning, WarningCode};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// One section handed to the reviewer
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRequest {
    /// Index of the section in the segmenter output
    pub index: usize,
    /// Section label
    pub label: SectionLabel,
    /// Section text
    pub text: String,
    /// Language of the contract
    pub language: Language,
    /// Contract type
    pub contract_type: ContractType,
}

/// Outcome of reviewing one section
///
/// A review never fails: problems with the collaborators are reported as
/// warnings and the section simply contributes no issues.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionReview {
    /// Index of the reviewed section
    pub index: usize,
    /// Issues found by the model, tagged with the section
    pub issues: Vec<ComplianceIssue>,
    /// The model's short assessment of the section
    pub summary: Option<String>,
    /// Degradations hit while reviewing
    pub warnings: Vec<Warning>,
}

/// Reviews one section at a time
///
/// Implementations must be shareable across tasks; the pipeline spawns one
/// review per section and joins them before scoring.
#[async_trait]
pub trait SectionAnalyzer: Send + Sync {
    /// Whether the section is worth a review at all
    fn wants(&self, label: SectionLabel, text: &str) -> bool;

    /// Review one section
    async fn analyze(&self, request: SectionRequest) -> SectionReview;
}

/// Retrieves statutory passages for a section and asks the model to judge it
pub struct RagOrchestrator<L, R>
where
    L: LlmProvider,
    R: PassageRetriever,
{
    llm: Arc<L>,
    retriever: Arc<R>,
    config: RagConfig,
}

impl<L, R> RagOrchestrator<L, R>
where
    L: LlmProvider + 'static,
    R: PassageRetriever + 'static,
{
    /// Create an orchestrator; fails on an invalid configuration
    pub fn new(llm: L, retriever: R, config: RagConfig) -> Result<Self, RagError> {
        Self::from_shared(Arc::new(llm), Arc::new(retriever), config)
    }

    /// Create an orchestrator over collaborators that are shared elsewhere
    pub fn from_shared(llm: Arc<L>, retriever: Arc<R>, config: RagConfig) -> Result<Self, RagError> {
        config.validate().map_err(RagError::Config)?;
        Ok(Self { llm, retriever, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Look up the passages for a section
    ///
    /// A slow or failing vector store yields an error; the caller decides
    /// whether to continue without context.
    pub async fn retrieve(&self, text: &str) -> Result<Vec<RetrievedPassage>, RagError> {
        let passages = timeout(
            self.config.retrieval_timeout(),
            self.retriever.retrieve(text, self.config.top_k),
        )
        .await
        .map_err(|_| RagError::Retrieval("vector store timed out".to_string()))?
        .map_err(|e| RagError::Retrieval(e.to_string()))?;

        debug!("Retrieved {} passages", passages.len());
        Ok(passages)
    }

    /// Call the model with timeout and bounded retries
    ///
    /// Timeouts and transient provider errors are retried after an exponential
    /// backoff; any other error ends the attempts at once.
    pub async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let max_attempts = self.config.max_retries + 1;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = timeout(
                self.config.request_timeout(),
                self.llm.generate_structured(prompt, ISSUE_SCHEMA),
            )
            .await;

            match outcome {
                Ok(Ok(response)) => {
                    debug!("Model answered on attempt {} ({} chars)", attempts, response.len());
                    return Ok(response);
                }
                Ok(Err(e)) => {
                    warn!(
                        "Model {} failed on attempt {}/{}: {}",
                        self.llm.model_name(),
                        attempts,
                        max_attempts,
                        e
                    );
                    if !self.llm.is_retryable(&e) || attempts >= max_attempts {
                        return Err(RagError::Llm(e.to_string()));
                    }
                }
                Err(_) => {
                    warn!(
                        "Model {} timed out on attempt {}/{}",
                        self.llm.model_name(),
                        attempts,
                        max_attempts
                    );
                    if attempts >= max_attempts {
                        return Err(RagError::Timeout(attempts));
                    }
                }
            }

            sleep(self.config.backoff(attempts)).await;
        }
    }

    /// Review one section, returning the first error instead of a warning
    pub async fn try_analyze(
        &self,
        request: &SectionRequest,
        warnings: &mut Vec<Warning>,
    ) -> Result<ParsedReview, RagError> {
        let text = truncate_chars(request.text.trim(), self.config.max_section_chars);

        let passages = match self.retrieve(text).await {
            Ok(passages) => passages,
            Err(e) => {
                warn!("Section {}: reviewing without legal context: {}", request.index, e);
                warnings.push(Warning::new(
                    Stage::Rag,
                    WarningCode::LlmUnavailable,
                    format!("section {}: {}; reviewed without legal context", request.index, e),
                ));
                Vec::new()
            }
        };

        let prompt = PromptBuilder::new(text, request.label, request.language)
            .with_contract_type(request.contract_type)
            .with_passages(&passages)
            .build();
        debug!("Section {}: prompt length {} chars", request.index, prompt.len());

        let response = self.generate(&prompt).await?;
        parse_llm_response(&response)
    }
}

#[async_trait]
impl<L, R> SectionAnalyzer for RagOrchestrator<L, R>
where
    L: LlmProvider + 'static,
    R: PassageRetriever + 'static,
{
    fn wants(&self, label: SectionLabel, text: &str) -> bool {
        self.config.is_eligible(label) && text.trim().chars().count() >= self.config.min_section_chars
    }

    async fn analyze(&self, request: SectionRequest) -> SectionReview {
        let started = Instant::now();
        let mut review = SectionReview {
            index: request.index,
            ..SectionReview::default()
        };

        match self.try_analyze(&request, &mut review.warnings).await {
            Ok(parsed) => {
                if !parsed.rejected.is_empty() {
                    review.warnings.push(Warning::new(
                        Stage::Rag,
                        WarningCode::LlmSchemaViolation,
                        format!(
                            "section {}: dropped {} malformed issue(s): {}",
                            request.index,
                            parsed.rejected.len(),
                            parsed.rejected.join("; ")
                        ),
                    ));
                }
                review.issues = parsed
                    .issues
                    .into_iter()
                    .map(|issue| issue.in_section(request.index, request.label))
                    .collect();
                review.summary = parsed.summary;
            }
            Err(e) => {
                let code = if e.is_schema_error() {
                    WarningCode::LlmSchemaViolation
                } else {
                    WarningCode::LlmUnavailable
                };
                warn!("Section {} skipped for model review: {}", request.index, e);
                review
                    .warnings
                    .push(Warning::new(Stage::Rag, code, format!("section {}: {}", request.index, e)));
            }
        }

        info!(
            "Reviewed section {} ({}) in {} ms: {} issue(s), {} warning(s)",
            request.index,
            request.label.as_str(),
            started.elapsed().as_millis(),
            review.issues.len(),
            review.warnings.len()
        );
        review
    }
}
