//! Language module - the three document languages and their scripts

use serde::{Deserialize, Serialize};

/// Language of a contract
///
/// Uzbek is written in two scripts, so the script is part of the language value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Uzbek, Latin script (the default)
    UzLatin,

    /// Uzbek, Cyrillic script
    UzCyrillic,

    /// Russian
    Ru,
}

impl Language {
    /// Get the language code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::UzLatin => "uz_latin",
            Language::UzCyrillic => "uz_cyrillic",
            Language::Ru => "ru",
        }
    }

    /// Parse a language code, accepting the common aliases
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "uz_latin" | "uz_latn" | "uz" | "uzb" => Some(Language::UzLatin),
            "uz_cyrillic" | "uz_cyrl" | "uzb_cyrl" => Some(Language::UzCyrillic),
            "ru" | "rus" => Some(Language::Ru),
            _ => None,
        }
    }

    /// Script the language is written in
    pub fn script(&self) -> Script {
        match self {
            Language::UzLatin => Script::Latin,
            Language::UzCyrillic | Language::Ru => Script::Cyrillic,
        }
    }

    /// Human-readable name used in summaries
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::UzLatin => "O'zbek (lotin)",
            Language::UzCyrillic => "O'zbek (kirill)",
            Language::Ru => "Rus",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::UzLatin
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid language: {}", s))
    }
}

/// Writing system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    /// Latin alphabet
    Latin,
    /// Cyrillic alphabet
    Cyrillic,
}

impl Script {
    /// Get the script name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Script::Latin => "latin",
            Script::Cyrillic => "cyrillic",
        }
    }
}

/// Result of language detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetection {
    /// Winning language
    pub language: Language,

    /// Share of votes won by the language, in [0.0, 1.0]
    pub confidence: f32,
}

impl LanguageDetection {
    /// Fallback used for empty or letter-free text
    pub fn fallback() -> Self {
        Self {
            language: Language::UzLatin,
            confidence: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse_aliases() {
        assert_eq!(Language::parse("uz-latn"), Some(Language::UzLatin));
        assert_eq!(Language::parse("UZ_CYRL"), Some(Language::UzCyrillic));
        assert_eq!(Language::parse("rus"), Some(Language::Ru));
        assert_eq!(Language::parse("en"), None);
    }

    #[test]
    fn test_language_script() {
        assert_eq!(Language::UzLatin.script(), Script::Latin);
        assert_eq!(Language::UzCyrillic.script(), Script::Cyrillic);
        assert_eq!(Language::Ru.script(), Script::Cyrillic);
    }

    #[test]
    fn test_language_serde_name() {
        let json = serde_json::to_string(&Language::UzCyrillic).unwrap();
        assert_eq!(json, "\"uz_cyrillic\"");
    }
}
