//! Configuration for extraction and OCR

use crate::preprocess::Preprocessing;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the OCR subsystem and the native-text density check
///
/// Built once at run start and passed down; no stage reads the environment itself.
///
/// # Examples
///
/// ```
/// use shartnoma_extract::OcrConfig;
///
/// let config = OcrConfig::default();
/// assert_eq!(config.dpi, 400);
/// assert_eq!(config.pages_max, 0);
///
/// let config = OcrConfig::from_lookup(|key| match key {
///     "OCR_PAGES_MAX" => Some("3".to_string()),
///     _ => None,
/// });
/// assert_eq!(config.pages_max, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Maximum pages to OCR (0 = unlimited)
    pub pages_max: usize,

    /// Rasterization resolution
    pub dpi: u32,

    /// Pages rasterized per batch (0 = whole document at once)
    pub chunk_size: usize,

    /// Re-run low-confidence pages with the secondary recognizer
    pub secondary_enabled: bool,

    /// Page confidence below which the secondary recognizer is tried
    pub min_confidence: f32,

    /// Pages recognized concurrently
    pub workers: usize,

    /// Timeout for one recognizer call (seconds)
    pub page_timeout_secs: u64,

    /// Timeout for one rasterization batch (seconds)
    pub rasterize_timeout_secs: u64,

    /// Recognizer language hint; script is unknown before OCR
    pub languages: String,

    /// Native text per page below which a PDF counts as scanned
    pub min_chars_per_page: usize,

    /// Clean up page images before recognition
    pub preprocess: bool,

    /// Cleanup parameters
    pub preprocessing: Preprocessing,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            pages_max: 0,
            dpi: 400,
            chunk_size: 0,
            secondary_enabled: false,
            min_confidence: 0.6,
            workers: 4,
            page_timeout_secs: 120,
            rasterize_timeout_secs: 300,
            languages: "uzb+uzb_cyrl+rus".to_string(),
            min_chars_per_page: 50,
            preprocess: true,
            preprocessing: Preprocessing::default(),
        }
    }
}

impl OcrConfig {
    /// Aggressive preset: lower resolution, more workers, small batches
    pub fn aggressive() -> Self {
        Self {
            dpi: 300,
            chunk_size: 5,
            workers: 8,
            page_timeout_secs: 60,
            rasterize_timeout_secs: 120,
            ..Self::default()
        }
    }

    /// Lenient preset: secondary recognizer on, long timeouts
    pub fn lenient() -> Self {
        Self {
            secondary_enabled: true,
            min_confidence: 0.75,
            workers: 2,
            page_timeout_secs: 300,
            rasterize_timeout_secs: 600,
            ..Self::default()
        }
    }

    /// Read the `OCR_*` environment variables over the defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup over the defaults
    ///
    /// Unparseable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(lookup);
        config
    }

    /// Apply environment-style overrides to an existing configuration
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OCR_PAGES_MAX").and_then(|v| v.trim().parse().ok()) {
            self.pages_max = v;
        }
        if let Some(v) = lookup("OCR_DPI").and_then(|v| v.trim().parse().ok()) {
            self.dpi = v;
        }
        if let Some(v) = lookup("OCR_CHUNK_SIZE").and_then(|v| v.trim().parse().ok()) {
            self.chunk_size = v;
        }
        if let Some(v) = lookup("OCR_SECONDARY") {
            self.secondary_enabled = is_truthy(&v);
        }
        if let Some(v) = lookup("OCR_PREPROCESS") {
            self.preprocess = is_truthy(&v);
        }
    }

    /// Cleanup to apply before recognition, if enabled
    pub fn page_preprocessing(&self) -> Option<Preprocessing> {
        self.preprocess.then_some(self.preprocessing)
    }

    /// Get the per-page recognizer timeout as a Duration
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// Get the rasterization timeout as a Duration
    pub fn rasterize_timeout(&self) -> Duration {
        Duration::from_secs(self.rasterize_timeout_secs)
    }

    /// Number of pages to process out of `page_count`
    pub fn page_limit(&self, page_count: usize) -> usize {
        if self.pages_max == 0 {
            page_count
        } else {
            page_count.min(self.pages_max)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(72..=1200).contains(&self.dpi) {
            return Err(format!("dpi must be between 72 and 1200, got {}", self.dpi));
        }
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("min_confidence must be between 0.0 and 1.0".to_string());
        }
        if self.page_timeout_secs == 0 || self.rasterize_timeout_secs == 0 {
            return Err("timeouts must be greater than 0".to_string());
        }
        if self.languages.trim().is_empty() {
            return Err("languages must not be empty".to_string());
        }
        self.preprocessing.validate()
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

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(OcrConfig::default().validate().is_ok());
        assert!(OcrConfig::aggressive().validate().is_ok());
        assert!(OcrConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = OcrConfig::from_lookup(|key| match key {
            "OCR_PAGES_MAX" => Some("10".to_string()),
            "OCR_DPI" => Some(" 300 ".to_string()),
            "OCR_SECONDARY" => Some("true".to_string()),
            "OCR_CHUNK_SIZE" => Some("not-a-number".to_string()),
            "OCR_PREPROCESS" => Some("off".to_string()),
            _ => None,
        });
        assert!(!config.preprocess);
        assert!(config.page_preprocessing().is_none());
        assert_eq!(config.pages_max, 10);
        assert_eq!(config.dpi, 300);
        assert!(config.secondary_enabled);
        assert_eq!(config.chunk_size, 0);
    }

    #[test]
    fn test_page_limit() {
        let mut config = OcrConfig::default();
        assert_eq!(config.page_limit(5), 5);
        config.pages_max = 3;
        assert_eq!(config.page_limit(5), 3);
        assert_eq!(config.page_limit(2), 2);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = OcrConfig::default();
        config.workers = 0;
        assert!(config.validate().is_err());

        let mut config = OcrConfig::default();
        config.dpi = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = OcrConfig::from_toml("pages_max = 3\nsecondary_enabled = true").unwrap();
        assert_eq!(config.pages_max, 3);
        assert!(config.secondary_enabled);
        assert_eq!(config.dpi, 400);

        let round = OcrConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(round, config);
    }
}
