//! The analysis run
//!
//! One run walks the stages in a fixed order:
//!
//! ```text
//! extraction/ocr -> segmentation -> [model review, spawned]
//!                                -> compliance -> spelling
//!                                -> [model review, collected] -> scoring -> assembly
//! ```
//!
//! Every stage error goes through the [`StagePolicy`]: fatal errors fail the
//! run, everything else becomes a warning on the result and the run goes on
//! with less content. Cancellation and the hard budget are checked at every
//! stage boundary and while section reviews are outstanding.

use crate::budget::{CancelSignal, RunBudget};
use crate::config::PipelineConfig;
use crate::error::{Disposition, ErrorKind, PipelineError, StageError, StagePolicy};
use crate::metrics::PipelineMetrics;
use crate::spelling::rules::{looks_like_surname, SpellingRules};
use crate::spelling::spelling_issues;
use crate::summary::{contract_summary, not_a_contract_summary, NOT_A_CONTRACT_RECOMMENDATIONS};
use shartnoma_compliance::{ComplianceEngine, ComplianceInput};
use shartnoma_domain::traits::{CollaboratorError, SpellChecker};
use shartnoma_domain::{
    AnalysisRequest, AnalysisResult, ComplianceIssue, Document, Language, ScoreBreakdown, SectionLabel,
    Stage, Warning, WarningCode,
};
use shartnoma_extract::TextExtractor;
use shartnoma_parser::{ContractParser, ParsedContract};
use shartnoma_rag::{SectionAnalyzer, SectionRequest, SectionReview};
use shartnoma_risk::{tag_sections, RiskInput, RiskLevel, RiskScorer};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// State carried from stage to stage within one run
struct Run<'a> {
    budget: RunBudget,
    cancel: &'a CancelSignal,
    soft_reported: bool,
    timings: PipelineMetrics,
    text: String,
    parsed: Option<ParsedContract>,
    issues: Vec<ComplianceIssue>,
    model_issues: Vec<ComplianceIssue>,
    notes: Vec<(SectionLabel, String)>,
}

impl<'a> Run<'a> {
    fn new(config: &PipelineConfig, cancel: &'a CancelSignal) -> Self {
        Self {
            budget: RunBudget::start(config.soft_budget(), config.hard_budget()),
            cancel,
            soft_reported: false,
            timings: PipelineMetrics::new(),
            text: String::new(),
            parsed: None,
            issues: Vec::new(),
            model_issues: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Contract analysis pipeline
///
/// Holds no per-run state: analyzing the same request twice gives two
/// independent results with the same content.
pub struct Pipeline {
    config: PipelineConfig,
    extractor: TextExtractor,
    parser: ContractParser,
    compliance: ComplianceEngine,
    scorer: RiskScorer,
    analyzer: Option<Arc<dyn SectionAnalyzer>>,
    speller: Option<Arc<dyn SpellChecker>>,
    russian_speller: Option<Arc<dyn SpellChecker>>,
    spelling_rules: SpellingRules,
    policy: StagePolicy,
    metrics: Mutex<PipelineMetrics>,
}

impl Pipeline {
    /// Create a pipeline without model review or spellchecking
    pub fn new(config: PipelineConfig, extractor: TextExtractor) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        Ok(Self {
            extractor,
            parser: ContractParser::new(config.parser.clone()),
            compliance: ComplianceEngine::new(config.compliance.clone()),
            scorer: RiskScorer::new(config.risk.clone()),
            analyzer: None,
            speller: None,
            russian_speller: None,
            spelling_rules: SpellingRules::new(),
            policy: StagePolicy,
            metrics: Mutex::new(PipelineMetrics::new()),
            config,
        })
    }

    /// Review sections with `analyzer`
    pub fn with_analyzer(mut self, analyzer: Arc<dyn SectionAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Check Uzbek spelling with `checker`
    pub fn with_spell_checker(mut self, checker: Arc<dyn SpellChecker>) -> Self {
        self.speller = Some(checker);
        self
    }

    /// Check Russian spelling with `checker`
    pub fn with_russian_spell_checker(mut self, checker: Arc<dyn SpellChecker>) -> Self {
        self.russian_speller = Some(checker);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Counters over every run so far
    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Analyze one document
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult {
        self.analyze_with_cancel(request, &CancelSignal::new()).await
    }

    /// Analyze one document, stopping early when `cancel` fires
    ///
    /// Always returns a result in a terminal state. A run stopped before the
    /// text was segmented fails; a run stopped later completes with the
    /// content gathered so far and a `cancelled` warning.
    pub async fn analyze_with_cancel(&self, request: &AnalysisRequest, cancel: &CancelSignal) -> AnalysisResult {
        let mut result = AnalysisResult::started(request.document.id);
        let mut run = Run::new(&self.config, cancel);
        info!(
            "Analysis {} started for document {} ({})",
            result.id,
            request.document.id,
            request.document.kind.as_str()
        );

        match self.execute(request, &mut result, &mut run).await {
            Ok(()) => {
                self.finish(&mut result, &mut run);
                if let Err(e) = result.complete() {
                    error!("Analysis {}: {}", result.id, e);
                }
            }
            Err(e) => {
                error!("Analysis {} failed: {}", result.id, e);
                if let Err(t) = result.fail(e.to_string()) {
                    error!("Analysis {}: {}", result.id, t);
                }
            }
        }

        result.duration_ms = run.budget.elapsed().as_millis() as u64;
        info!(
            "Analysis {} {} in {} ms: risk {}/100, {} issue(s), {} warning(s)",
            result.id,
            result.status.as_str(),
            result.duration_ms,
            result.risk_score,
            result.issues.len(),
            result.warnings.len()
        );

        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_run(&result);
            metrics.merge(&run.timings);
        }
        result
    }

    /// Stages up to and including the collection of section reviews
    ///
    /// Returns an error only when the policy says the run cannot go on.
    async fn execute(
        &self,
        request: &AnalysisRequest,
        result: &mut AnalysisResult,
        run: &mut Run<'_>,
    ) -> Result<(), StageError> {
        run.text = self.extract(&request.document, result, run).await?;

        if !self.checkpoint(Stage::Segmentation, result, run)? {
            return Ok(());
        }
        let started = Instant::now();
        let parsed = self
            .parser
            .parse(&run.text, request.declared_language, request.declared_type);
        run.timings.record_stage(Stage::Segmentation, started.elapsed());
        info!(
            "Parsed {} section(s), language {} ({:.2}), type {}",
            parsed.sections.len(),
            parsed.language.language.as_str(),
            parsed.language.confidence,
            parsed.contract_type.as_str()
        );

        result.language = Some(parsed.language.language);
        result.contract_type = parsed.contract_type;
        result.metadata = parsed.metadata.clone();
        if !parsed.is_contract {
            warn!("Document {} does not read as a contract", request.document.id);
            result.warnings.push(Warning::new(
                Stage::Segmentation,
                WarningCode::NotAContract,
                "No contract structure found; only spelling is checked",
            ));
        }

        let reviews = self.spawn_reviews(&parsed, result, run)?;
        self.check_compliance(&parsed, result, run)?;
        self.check_spelling(&parsed, result, run).await?;
        if let Some(reviews) = reviews {
            self.collect_reviews(reviews, &parsed, result, run).await?;
        }

        run.parsed = Some(parsed);
        Ok(())
    }

    async fn extract(
        &self,
        document: &Document,
        result: &mut AnalysisResult,
        run: &mut Run<'_>,
    ) -> Result<String, StageError> {
        if !self.checkpoint(Stage::Extraction, result, run)? {
            return Ok(String::new());
        }

        let started = Instant::now();
        let cancel = run.cancel;
        let outcome = tokio::select! {
            extracted = tokio::time::timeout(run.budget.remaining(), self.extractor.extract(document)) => match extracted {
                Ok(Ok(extraction)) => Ok(extraction),
                Ok(Err(e)) => Err(StageError::from_extract(e)),
                Err(_) => Err(StageError::over_budget(Stage::Extraction, run.budget.elapsed().as_millis())),
            },
            _ = cancel.cancelled() => Err(StageError::cancelled(Stage::Extraction)),
        };

        let extraction = match outcome {
            Ok(extraction) => extraction,
            Err(e) => {
                self.absorb(e, result)?;
                return Ok(String::new());
            }
        };

        let stage = if extraction.is_scanned { Stage::Ocr } else { Stage::Extraction };
        run.timings.record_stage(stage, started.elapsed());
        result.is_scanned = extraction.is_scanned;
        result.ocr_confidence = extraction.ocr_confidence;
        result.warnings.extend(extraction.warnings.iter().cloned());

        if extraction.visible_chars() == 0 {
            self.absorb(
                StageError::new(stage, ErrorKind::EmptyText, "No text could be extracted from the document"),
                result,
            )?;
        }
        Ok(extraction.text)
    }

    /// Start one review task per eligible section
    fn spawn_reviews(
        &self,
        parsed: &ParsedContract,
        result: &mut AnalysisResult,
        run: &mut Run<'_>,
    ) -> Result<Option<JoinSet<SectionReview>>, StageError> {
        let Some(analyzer) = &self.analyzer else {
            return Ok(None);
        };
        if !self.config.stages.rag || !parsed.is_contract {
            debug!("Model review disabled for this run");
            return Ok(None);
        }
        if !self.checkpoint(Stage::Rag, result, run)? {
            return Ok(None);
        }

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_sections));
        let mut reviews = JoinSet::new();
        for (index, section) in parsed.sections.iter().enumerate() {
            let text = section.text(&run.text);
            if !analyzer.wants(section.label, text) {
                continue;
            }
            let request = SectionRequest {
                index,
                label: section.label,
                text: text.to_string(),
                language: parsed.language.language,
                contract_type: parsed.contract_type,
            };
            let analyzer = Arc::clone(analyzer);
            let permits = Arc::clone(&permits);
            reviews.spawn(async move {
                // The semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                analyzer.analyze(request).await
            });
        }

        debug!(
            "Spawned {} section review(s), at most {} at a time",
            reviews.len(),
            self.config.max_concurrent_sections
        );
        Ok(Some(reviews))
    }

    fn check_compliance(
        &self,
        parsed: &ParsedContract,
        result: &mut AnalysisResult,
        run: &mut Run<'_>,
    ) -> Result<(), StageError> {
        if !self.config.stages.compliance {
            debug!("Compliance stage disabled");
            return Ok(());
        }
        if !self.checkpoint(Stage::Compliance, result, run)? {
            return Ok(());
        }

        let started = Instant::now();
        let report = self.compliance.check(&ComplianceInput {
            text: &run.text,
            sections: &parsed.sections,
            metadata: &parsed.metadata,
            contract_type: parsed.contract_type,
            language: parsed.language.language,
            is_contract: parsed.is_contract,
        });

        for failure in report.failures {
            self.absorb(
                StageError::new(
                    Stage::Compliance,
                    ErrorKind::RuleEvaluationError,
                    format!("rule {}: {}", failure.rule_id, failure.message),
                ),
                result,
            )?;
        }

        info!("Compliance rules raised {} issue(s)", report.issues.len());
        run.issues.extend(report.issues);
        run.timings.record_stage(Stage::Compliance, started.elapsed());
        Ok(())
    }

    async fn check_spelling(
        &self,
        parsed: &ParsedContract,
        result: &mut AnalysisResult,
        run: &mut Run<'_>,
    ) -> Result<(), StageError> {
        if !self.config.stages.spelling {
            debug!("Spelling stage disabled");
            return Ok(());
        }
        if !self.checkpoint(Stage::Spelling, result, run)? {
            return Ok(());
        }

        let started = Instant::now();
        let language = parsed.language.language;
        let mut found = self.spelling_rules.check(&run.text, language);
        debug!("Local spelling rules flagged {} word(s)", found.len());

        let checker = match language {
            Language::Ru => &self.russian_speller,
            Language::UzLatin | Language::UzCyrillic => &self.speller,
        };
        if let Some(checker) = checker {
            let limit = self.config.spelling.stage_timeout();
            let remote = match tokio::time::timeout(limit, checker.check(&run.text, language.script())).await {
                Ok(Ok(remote)) => remote,
                Ok(Err(e)) => {
                    self.absorb(StageError::from_collaborator(Stage::Spelling, e), result)?;
                    Vec::new()
                }
                Err(_) => {
                    let e = CollaboratorError::Timeout(format!("no answer within {:?}", limit));
                    self.absorb(StageError::from_collaborator(Stage::Spelling, e), result)?;
                    Vec::new()
                }
            };
            let flagged: HashSet<usize> = found.iter().map(|s| s.offset).collect();
            found.extend(remote.into_iter().filter(|s| {
                !flagged.contains(&s.offset)
                    && !self.spelling_rules.is_whitelisted(&s.word)
                    && !looks_like_surname(&s.word)
            }));
        } else if language == Language::Ru {
            debug!("No Russian spellchecker configured, local rules only");
        }
        found.sort_by_key(|s| s.offset);

        let issues = spelling_issues(&run.text, &parsed.sections, &found, self.config.spelling.max_issues);
        info!("Spellchecking flagged {} word(s)", issues.len());
        run.issues.extend(issues);
        run.timings.record_stage(Stage::Spelling, started.elapsed());
        Ok(())
    }

    /// Wait for the section reviews, giving up at the hard deadline or on cancel
    async fn collect_reviews(
        &self,
        mut pending: JoinSet<SectionReview>,
        parsed: &ParsedContract,
        result: &mut AnalysisResult,
        run: &mut Run<'_>,
    ) -> Result<(), StageError> {
        let started = Instant::now();
        let deadline = run.budget.hard_deadline();
        let cancel = run.cancel;
        let mut reviews = Vec::new();
        let mut interrupted = None;

        loop {
            tokio::select! {
                joined = pending.join_next() => match joined {
                    None => break,
                    Some(Ok(review)) => reviews.push(review),
                    Some(Err(e)) => self.absorb(
                        StageError::new(
                            Stage::Rag,
                            ErrorKind::CollaboratorUnavailable,
                            format!("section review task failed: {}", e),
                        ),
                        result,
                    )?,
                },
                _ = tokio::time::sleep_until(deadline) => {
                    interrupted = Some(StageError::over_budget(Stage::Rag, run.budget.elapsed().as_millis()));
                    break;
                }
                _ = cancel.cancelled() => {
                    interrupted = Some(StageError::cancelled(Stage::Rag));
                    break;
                }
            }
        }

        if let Some(e) = interrupted {
            let abandoned = pending.len();
            pending.abort_all();
            self.absorb(
                StageError::new(
                    e.stage,
                    e.kind,
                    format!("{}; {} section review(s) abandoned", e.message, abandoned),
                ),
                result,
            )?;
        }

        reviews.sort_by_key(|r| r.index);
        for review in reviews {
            result.warnings.extend(review.warnings);
            if let (Some(note), Some(section)) = (review.summary, parsed.sections.get(review.index)) {
                run.notes.push((section.label, note));
            }
            run.model_issues.extend(review.issues);
        }
        run.timings.record_stage(Stage::Rag, started.elapsed());
        Ok(())
    }

    /// Scoring and assembly; these run for every run that did not fail
    fn finish(&self, result: &mut AnalysisResult, run: &mut Run<'_>) {
        self.note_soft_budget(Stage::Scoring, result, run);
        let started = Instant::now();

        let mut issues = std::mem::take(&mut run.issues);
        let added = merge_issues(&mut issues, std::mem::take(&mut run.model_issues));
        debug!("Kept {} model issue(s) after deduplication", added);

        let (level, recommendations) = match &run.parsed {
            Some(parsed) if parsed.is_contract => {
                let assessment = self.scorer.assess(&RiskInput {
                    text: &run.text,
                    sections: &parsed.sections,
                    metadata: &parsed.metadata,
                    issues: &issues,
                    required: self.compliance.config().required_for(parsed.contract_type),
                });
                result.risk_score = assessment.risk_score;
                result.compliance_score = assessment.compliance_score;
                result.scores = assessment.scores;
                (assessment.level, assessment.recommendations)
            }
            _ => {
                // Nothing to score
                result.risk_score = 0;
                result.compliance_score = 0;
                result.scores = ScoreBreakdown::default();
                (
                    RiskLevel::High,
                    NOT_A_CONTRACT_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
                )
            }
        };
        if let Some(parsed) = &run.parsed {
            result.sections = tag_sections(&parsed.sections, &issues);
        }
        run.timings.record_stage(Stage::Scoring, started.elapsed());

        let started = Instant::now();
        // Stable, so issues of equal severity keep their stage order
        issues.sort_by(|a, b| b.severity.cmp(&a.severity));
        result.issues = issues;
        result.recommendations = recommendations;
        result.summary = match &run.parsed {
            Some(parsed) if parsed.is_contract => contract_summary(result, level, &run.notes),
            _ => not_a_contract_summary(result),
        };
        run.timings.record_stage(Stage::Assembly, started.elapsed());
    }

    /// Cancel and hard budget check before `stage`
    ///
    /// `Ok(false)` means the stage is skipped and a warning was recorded.
    fn checkpoint(&self, stage: Stage, result: &mut AnalysisResult, run: &mut Run<'_>) -> Result<bool, StageError> {
        self.note_soft_budget(stage, result, run);

        let stop = if run.cancel.is_cancelled() {
            Some(StageError::cancelled(stage))
        } else if run.budget.hard_exceeded() {
            Some(StageError::over_budget(stage, run.budget.elapsed().as_millis()))
        } else {
            None
        };

        match stop {
            Some(e) => {
                self.absorb(e, result)?;
                Ok(false)
            }
            None => Ok(true),
        }
    }

    fn note_soft_budget(&self, stage: Stage, result: &mut AnalysisResult, run: &mut Run<'_>) {
        if run.soft_reported || !run.budget.soft_exceeded() {
            return;
        }
        run.soft_reported = true;
        warn!(
            "Analysis {} passed its soft budget of {} ms before {}",
            result.id, self.config.soft_budget_ms, stage
        );
        result.warnings.push(Warning::new(
            stage,
            WarningCode::SoftBudgetExceeded,
            format!("Soft budget of {} ms exceeded before {}", self.config.soft_budget_ms, stage),
        ));
    }

    /// Apply the policy to a stage error
    fn absorb(&self, error: StageError, result: &mut AnalysisResult) -> Result<(), StageError> {
        match self.policy.disposition(&error) {
            Disposition::Fatal => Err(error),
            Disposition::Recover => {
                warn!("Recovered from {}", error);
                result.warnings.push(error.to_warning());
                Ok(())
            }
        }
    }
}

/// Whether `candidate` restates `existing`
///
/// Same issue type and either the same cited article of the same law in a
/// compatible section, or the same section and title.
fn restates(existing: &ComplianceIssue, candidate: &ComplianceIssue) -> bool {
    if existing.issue_type != candidate.issue_type {
        return false;
    }
    let compatible_section = match (existing.section, candidate.section) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    };
    if compatible_section {
        if let (Some(a), Some(b)) = (&existing.citation, &candidate.citation) {
            if !a.article.trim().is_empty() && a.article.trim() == b.article.trim() && same_law(&a.law_name, &b.law_name) {
                return true;
            }
        }
    }
    existing.section == candidate.section && existing.title.trim().to_lowercase() == candidate.title.trim().to_lowercase()
}

/// Law names match when either contains the other, ignoring case
fn same_law(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}

/// Append model issues that no earlier issue already covers
///
/// Returns how many were kept.
pub fn merge_issues(issues: &mut Vec<ComplianceIssue>, model: Vec<ComplianceIssue>) -> usize {
    let mut added = 0;
    for candidate in model {
        if issues.iter().any(|existing| restates(existing, &candidate)) {
            debug!("Dropping duplicate model issue '{}'", candidate.title);
            continue;
        }
        issues.push(candidate);
        added += 1;
    }
    added
}
