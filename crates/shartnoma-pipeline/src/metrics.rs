//! Metrics collection across pipeline runs

use shartnoma_domain::{AnalysisResult, AnalysisStatus, Stage, WarningCode};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Counters collected over the runs of one pipeline
///
/// Tracks run outcomes, warnings per code, and time spent per stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    /// Runs that reached `completed`
    pub completed: usize,

    /// Runs that reached `failed`
    pub failed: usize,

    /// Completed runs that lost content in some stage
    pub degraded: usize,

    /// Warnings raised, per code
    pub warnings: HashMap<WarningCode, usize>,

    /// Time spent per stage, in milliseconds
    pub stage_ms: BTreeMap<Stage, u64>,
}

impl PipelineMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record time spent in a stage
    pub fn record_stage(&mut self, stage: Stage, elapsed: Duration) {
        *self.stage_ms.entry(stage).or_insert(0) += elapsed.as_millis() as u64;
    }

    /// Record the outcome of a finished run
    pub fn record_run(&mut self, result: &AnalysisResult) {
        match result.status {
            AnalysisStatus::Completed => {
                self.completed += 1;
                if result.is_degraded() {
                    self.degraded += 1;
                }
            }
            AnalysisStatus::Failed => self.failed += 1,
            AnalysisStatus::Queued | AnalysisStatus::InProgress => {}
        }
        for warning in &result.warnings {
            *self.warnings.entry(warning.code).or_insert(0) += 1;
        }
    }

    /// Add the counters of another collection
    pub fn merge(&mut self, other: &PipelineMetrics) {
        self.completed += other.completed;
        self.failed += other.failed;
        self.degraded += other.degraded;
        for (code, count) in &other.warnings {
            *self.warnings.entry(*code).or_insert(0) += count;
        }
        for (stage, ms) in &other.stage_ms {
            *self.stage_ms.entry(*stage).or_insert(0) += ms;
        }
    }

    /// Get total runs recorded
    pub fn total_runs(&self) -> usize {
        self.completed + self.failed
    }

    /// Get total warnings across all codes
    pub fn total_warnings(&self) -> usize {
        self.warnings.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Pipeline Metrics Summary".to_string(),
            format!(
                "Runs: {} ({} completed, {} degraded, {} failed)",
                self.total_runs(),
                self.completed,
                self.degraded,
                self.failed
            ),
        ];

        if !self.stage_ms.is_empty() {
            lines.push("Stage time:".to_string());
            for (stage, ms) in &self.stage_ms {
                lines.push(format!("  {}: {} ms", stage, ms));
            }
        }

        if !self.warnings.is_empty() {
            let mut codes: Vec<_> = self.warnings.iter().collect();
            codes.sort_by_key(|(code, _)| code.as_str());
            lines.push(format!("Warnings: {}", self.total_warnings()));
            for (code, count) in codes {
                lines.push(format!("  {}: {}", code.as_str(), count));
            }
        }

        lines.join("\n")
    }
}
