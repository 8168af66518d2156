//! Configuration for analysis runs

use serde::{Deserialize, Serialize};
use shartnoma_compliance::ComplianceConfig;
use shartnoma_extract::OcrConfig;
use shartnoma_parser::ParserConfig;
use shartnoma_rag::RagConfig;
use shartnoma_risk::RiskConfig;
use std::time::Duration;

/// Default spellchecking service endpoint
pub const DEFAULT_SPELL_ENDPOINT: &str = "http://localhost:4000";

/// Optional stages that can be switched off
///
/// Extraction, segmentation, scoring and assembly always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    /// Rule-based compliance checks
    pub compliance: bool,
    /// Spellchecking collaborator
    pub spelling: bool,
    /// Retrieval-augmented model review
    pub rag: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            compliance: true,
            spelling: true,
            rag: true,
        }
    }
}

/// Spellchecking client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellingConfig {
    /// Base URL of the spellchecking service
    pub endpoint: String,

    /// Timeout of one word lookup (milliseconds)
    pub request_timeout_ms: u64,

    /// Timeout of the whole spelling stage (milliseconds)
    pub stage_timeout_ms: u64,

    /// Distinct words sent to the service per document
    pub max_words: usize,

    /// Words shorter than this are not checked
    pub min_word_chars: usize,

    /// Spelling issues kept per document
    pub max_issues: usize,

    /// LanguageTool server for Russian text; only local rules run without it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub russian_endpoint: Option<String>,
}

impl Default for SpellingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SPELL_ENDPOINT.to_string(),
            request_timeout_ms: 3_000,
            stage_timeout_ms: 60_000,
            max_words: 500,
            min_word_chars: 3,
            max_issues: 50,
            russian_endpoint: None,
        }
    }
}

impl SpellingConfig {
    /// Timeout of one lookup as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Timeout of the stage as Duration
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(format!("endpoint must be an http(s) URL, got '{}'", self.endpoint));
        }
        if let Some(endpoint) = &self.russian_endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(format!("russian_endpoint must be an http(s) URL, got '{}'", endpoint));
            }
        }
        if self.request_timeout_ms == 0 || self.stage_timeout_ms == 0 {
            return Err("timeouts must be positive".to_string());
        }
        if self.max_words == 0 {
            return Err("max_words must be at least 1".to_string());
        }
        if self.min_word_chars == 0 {
            return Err("min_word_chars must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Configuration of a pipeline run
///
/// Built once before a run and passed down to every stage; no stage reads
/// the environment on its own.
///
/// # Examples
///
/// ```
/// use shartnoma_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::from_toml(r#"
/// hard_budget_ms = 120000
///
/// [stages]
/// spelling = false
///
/// [ocr]
/// pages_max = 3
/// "#).unwrap();
///
/// assert!(!config.stages.spelling);
/// assert_eq!(config.ocr.pages_max, 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Elapsed time after which a run logs that it is slow (milliseconds)
    pub soft_budget_ms: u64,

    /// Elapsed time after which remaining optional stages are skipped (milliseconds)
    pub hard_budget_ms: u64,

    /// Sections reviewed by the model at the same time
    pub max_concurrent_sections: usize,

    /// Optional stages
    pub stages: StageToggles,

    /// Text extraction and OCR
    pub ocr: OcrConfig,

    /// Language detection and segmentation
    pub parser: ParserConfig,

    /// Rule set
    pub compliance: ComplianceConfig,

    /// Scoring
    pub risk: RiskConfig,

    /// Model review
    pub rag: RagConfig,

    /// Spellchecking client
    pub spelling: SpellingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            soft_budget_ms: 120_000,   // 2 minutes
            hard_budget_ms: 600_000,   // 10 minutes
            max_concurrent_sections: 4,
            stages: StageToggles::default(),
            ocr: OcrConfig::default(),
            parser: ParserConfig::default(),
            compliance: ComplianceConfig::default(),
            risk: RiskConfig::default(),
            rag: RagConfig::default(),
            spelling: SpellingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with tight budgets
    ///
    /// Suited to interactive use where a quick partial answer beats a slow
    /// complete one.
    pub fn aggressive() -> Self {
        Self {
            soft_budget_ms: 30_000,
            hard_budget_ms: 120_000,
            max_concurrent_sections: 8,
            ocr: OcrConfig::aggressive(),
            rag: RagConfig::aggressive(),
            ..Self::default()
        }
    }

    /// Create a configuration with generous budgets
    pub fn lenient() -> Self {
        Self {
            soft_budget_ms: 600_000,
            hard_budget_ms: 1_800_000,
            max_concurrent_sections: 2,
            ocr: OcrConfig::lenient(),
            rag: RagConfig::lenient(),
            compliance: ComplianceConfig::lenient(),
            ..Self::default()
        }
    }

    /// Create a configuration that needs no network collaborator
    ///
    /// Spelling stays on: only the local rules run unless a checker is attached.
    pub fn offline() -> Self {
        Self {
            stages: StageToggles {
                rag: false,
                ..StageToggles::default()
            },
            ..Self::default()
        }
    }

    /// Soft budget as Duration
    pub fn soft_budget(&self) -> Duration {
        Duration::from_millis(self.soft_budget_ms)
    }

    /// Hard budget as Duration
    pub fn hard_budget(&self) -> Duration {
        Duration::from_millis(self.hard_budget_ms)
    }

    /// Validate the configuration, nested sections included
    pub fn validate(&self) -> Result<(), String> {
        if self.hard_budget_ms == 0 {
            return Err("hard_budget_ms must be positive".to_string());
        }
        if self.soft_budget_ms > self.hard_budget_ms {
            return Err(format!(
                "soft_budget_ms ({}) exceeds hard_budget_ms ({})",
                self.soft_budget_ms, self.hard_budget_ms
            ));
        }
        if self.max_concurrent_sections == 0 {
            return Err("max_concurrent_sections must be at least 1".to_string());
        }

        self.ocr.validate().map_err(|e| format!("ocr: {}", e))?;
        self.parser.validate().map_err(|e| format!("parser: {}", e))?;
        self.compliance.validate().map_err(|e| format!("compliance: {}", e))?;
        self.risk.validate().map_err(|e| format!("risk: {}", e))?;
        self.rag.validate().map_err(|e| format!("rag: {}", e))?;
        self.spelling.validate().map_err(|e| format!("spelling: {}", e))?;
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.soft_budget(), Duration::from_secs(120));
        assert_eq!(config.hard_budget(), Duration::from_secs(600));
        assert!(config.stages.compliance && config.stages.spelling && config.stages.rag);
    }

    #[test]
    fn test_presets_are_valid() {
        for config in [
            PipelineConfig::aggressive(),
            PipelineConfig::lenient(),
            PipelineConfig::offline(),
        ] {
            assert!(config.validate().is_ok(), "{:?}", config.validate());
        }
        assert!(PipelineConfig::aggressive().hard_budget_ms < PipelineConfig::default().hard_budget_ms);
        assert!(!PipelineConfig::offline().stages.rag);
    }

    #[test]
    fn test_budget_validation() {
        let config = PipelineConfig {
            soft_budget_ms: 10_000,
            hard_budget_ms: 5_000,
            ..PipelineConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("soft_budget_ms"));

        let config = PipelineConfig {
            max_concurrent_sections: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nested_errors_are_prefixed() {
        let mut config = PipelineConfig::default();
        config.spelling.endpoint = "localhost:4000".to_string();
        assert!(config.validate().unwrap_err().starts_with("spelling:"));

        let mut config = PipelineConfig::default();
        config.spelling.russian_endpoint = Some("languagetool:8010".to_string());
        assert!(config.validate().unwrap_err().contains("russian_endpoint"));
        config.spelling.russian_endpoint = Some("http://localhost:8010".to_string());
        assert!(config.validate().is_ok());

        let mut config = PipelineConfig::default();
        config.rag.top_k = 0;
        assert!(config.validate().unwrap_err().starts_with("rag:"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = PipelineConfig::aggressive();
        let toml = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PipelineConfig::from_toml("[spelling]\nmax_words = 10\n").unwrap();
        assert_eq!(config.spelling.max_words, 10);
        assert_eq!(config.spelling.endpoint, DEFAULT_SPELL_ENDPOINT);
        assert_eq!(config.hard_budget_ms, 600_000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(PipelineConfig::from_toml("hard_budget_ms = \"soon\"").is_err());
    }
}
