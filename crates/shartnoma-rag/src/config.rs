//! Configuration for the legal review stage

use serde::{Deserialize, Serialize};
use shartnoma_domain::SectionLabel;
use std::time::Duration;

/// Configuration for the retrieval-augmented review of sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Passages retrieved per section
    pub top_k: usize,

    /// Retries after the first model call, on transient errors only
    pub max_retries: u32,

    /// Timeout of one model call (milliseconds)
    pub request_timeout_ms: u64,

    /// Timeout of one vector store query (milliseconds)
    pub retrieval_timeout_ms: u64,

    /// Delay before the first retry (milliseconds); doubles on every retry
    pub backoff_base_ms: u64,

    /// Sampling temperature handed to the model backend
    pub temperature: f32,

    /// Section text is cut to this many characters before prompting
    pub max_section_chars: usize,

    /// Sections shorter than this (characters) are not sent to the model
    pub min_section_chars: usize,

    /// Section labels reviewed by the model
    pub eligible_labels: Vec<SectionLabel>,
}

impl Default for RagConfig {
    fn default() -> Self {
        use SectionLabel::*;

        Self {
            top_k: 5,
            max_retries: 2,
            request_timeout_ms: 60_000,
            retrieval_timeout_ms: 10_000,
            backoff_base_ms: 500,
            temperature: 0.1,
            max_section_chars: 1000,
            min_section_chars: 30,
            eligible_labels: vec![
                Subject,
                Rights,
                Obligations,
                Price,
                Delivery,
                Warranty,
                Liability,
                ForceMajeure,
                Disputes,
                Termination,
                Confidentiality,
            ],
        }
    }
}

impl RagConfig {
    /// Aggressive preset: fewer passages, one retry, short timeouts
    pub fn aggressive() -> Self {
        Self {
            top_k: 3,
            max_retries: 1,
            request_timeout_ms: 20_000,
            retrieval_timeout_ms: 5_000,
            backoff_base_ms: 250,
            max_section_chars: 600,
            eligible_labels: vec![SectionLabel::Liability, SectionLabel::Price, SectionLabel::Subject],
            ..Self::default()
        }
    }

    /// Lenient preset: more context, longer timeouts
    pub fn lenient() -> Self {
        Self {
            top_k: 8,
            max_retries: 3,
            request_timeout_ms: 180_000,
            retrieval_timeout_ms: 30_000,
            max_section_chars: 2000,
            ..Self::default()
        }
    }

    /// Get the model call timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get the retrieval timeout as a Duration
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval_timeout_ms)
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    /// Whether sections with this label are reviewed
    pub fn is_eligible(&self, label: SectionLabel) -> bool {
        self.eligible_labels.contains(&label)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("top_k must be greater than 0".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be greater than 0".to_string());
        }
        if self.retrieval_timeout_ms == 0 {
            return Err("retrieval_timeout_ms must be greater than 0".to_string());
        }
        if self.max_section_chars == 0 {
            return Err("max_section_chars must be greater than 0".to_string());
        }
        if self.min_section_chars > self.max_section_chars {
            return Err("min_section_chars cannot exceed max_section_chars".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be in [0.0, 2.0]".to_string());
        }
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
    fn test_presets_are_valid() {
        assert!(RagConfig::default().validate().is_ok());
        assert!(RagConfig::aggressive().validate().is_ok());
        assert!(RagConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = RagConfig::default();
        config.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = RagConfig::default();
        config.min_section_chars = config.max_section_chars + 1;
        assert!(config.validate().is_err());

        let mut config = RagConfig::default();
        config.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles() {
        let config = RagConfig::default();
        assert_eq!(config.backoff(1), Duration::from_millis(500));
        assert_eq!(config.backoff(2), Duration::from_millis(1000));
        assert_eq!(config.backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_eligibility() {
        let config = RagConfig::default();
        assert!(config.is_eligible(SectionLabel::Liability));
        assert!(!config.is_eligible(SectionLabel::Requisites));
        assert!(!config.is_eligible(SectionLabel::Header));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RagConfig::aggressive();
        let toml_str = config.to_toml().unwrap();
        assert_eq!(RagConfig::from_toml(&toml_str).unwrap(), config);
    }
}
