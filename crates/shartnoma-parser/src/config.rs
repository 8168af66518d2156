//! Configuration for language detection and segmentation

use serde::{Deserialize, Serialize};

/// Configuration for the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Characters per language-detection window
    pub window_chars: usize,

    /// Letters a window needs before it gets a vote
    pub min_window_letters: usize,

    /// Longest line (characters) still considered a heading
    pub max_heading_chars: usize,

    /// Most words a heading may have
    pub max_heading_words: usize,

    /// Lexical overlap a heading needs before it opens a section
    pub min_heading_overlap: f32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            window_chars: 400,
            min_window_letters: 40,
            max_heading_chars: 120,
            max_heading_words: 10,
            min_heading_overlap: 0.3,
        }
    }
}

impl ParserConfig {
    /// Strict preset: only short, well-matched headings open sections
    pub fn strict() -> Self {
        Self {
            max_heading_chars: 80,
            max_heading_words: 6,
            min_heading_overlap: 0.5,
            ..Self::default()
        }
    }

    /// Lenient preset for noisy OCR text
    pub fn lenient() -> Self {
        Self {
            window_chars: 250,
            min_window_letters: 20,
            max_heading_chars: 160,
            max_heading_words: 14,
            min_heading_overlap: 0.2,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window_chars == 0 {
            return Err("window_chars must be greater than 0".to_string());
        }
        if self.min_window_letters > self.window_chars {
            return Err("min_window_letters cannot exceed window_chars".to_string());
        }
        if self.max_heading_chars == 0 || self.max_heading_words == 0 {
            return Err("heading limits must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_heading_overlap) {
            return Err("min_heading_overlap must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(ParserConfig::default().validate().is_ok());
        assert!(ParserConfig::strict().validate().is_ok());
        assert!(ParserConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_overlap() {
        let config = ParserConfig {
            min_heading_overlap: 1.5,
            ..ParserConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ParserConfig::from_toml("window_chars = 200").unwrap();
        assert_eq!(config.window_chars, 200);
        assert_eq!(config.max_heading_words, 10);
    }
}
