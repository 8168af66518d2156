//! Spellchecking collaborator clients
//!
//! The Uzbek service checks one word per request: `POST {endpoint}/api/spell`
//! with `{"word": ..., "script": "latin" | "cyrillic"}` answers
//! `{"word", "script", "correct", "suggestions"}`.
//!
//! Russian text goes to a LanguageTool server (`POST {endpoint}/v2/check`).
//! Local [`rules`] run for every language before either service.

pub mod rules;

use crate::config::SpellingConfig;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use shartnoma_domain::traits::{CollaboratorError, SpellChecker, SpellingSuggestion};
use shartnoma_domain::{ComplianceIssue, IssueSource, IssueType, Script, Section, Severity};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, Mutex};
use tracing::{debug, warn};

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{L}[\p{L}'ʻʼ‘’`]*").expect("word regex")
});

/// Words of `text` with their byte offsets, first occurrence only
///
/// Words containing an upper-case letter after the first character
/// (abbreviations, company names in capitals) are left out.
pub fn distinct_words(text: &str, min_chars: usize) -> Vec<(usize, &str)> {
    let mut seen = HashSet::new();
    WORD.find_iter(text)
        .map(|m| (m.start(), m.as_str()))
        .filter(|(_, word)| word.chars().count() >= min_chars)
        .filter(|(_, word)| !word.chars().skip(1).any(char::is_uppercase))
        .filter(|(_, word)| seen.insert(word.to_lowercase()))
        .collect()
}

#[derive(Serialize)]
struct SpellRequest<'a> {
    word: &'a str,
    script: &'a str,
}

#[derive(Deserialize)]
struct SpellResponse {
    correct: bool,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Client of the spellchecking microservice
pub struct HttpSpellChecker {
    endpoint: String,
    client: reqwest::Client,
    max_words: usize,
    min_word_chars: usize,
}

impl HttpSpellChecker {
    /// Create a client from the spelling configuration
    pub fn new(config: &SpellingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
            max_words: config.max_words,
            min_word_chars: config.min_word_chars,
        }
    }

    async fn check_word(&self, word: &str, script: Script) -> Result<SpellResponse, CollaboratorError> {
        let url = format!("{}/api/spell", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&SpellRequest {
                word,
                script: script.as_str(),
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout(format!("{}: {}", url, e))
                } else {
                    CollaboratorError::Unavailable(format!("{}: {}", url, e))
                }
            })?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Failed(format!(
                "'{}' rejected with status {}",
                word,
                response.status()
            )));
        }

        response
            .json::<SpellResponse>()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SpellChecker for HttpSpellChecker {
    async fn check(&self, text: &str, script: Script) -> Result<Vec<SpellingSuggestion>, CollaboratorError> {
        let words = distinct_words(text, self.min_word_chars);
        let total = words.len();
        let mut suggestions = Vec::new();
        let mut answered = 0;

        for (offset, word) in words.into_iter().take(self.max_words) {
            match self.check_word(word, script).await {
                Ok(response) => {
                    answered += 1;
                    if !response.correct {
                        suggestions.push(SpellingSuggestion {
                            offset,
                            word: word.to_string(),
                            suggestions: response.suggestions,
                        });
                    }
                }
                // Service down: no point asking about the remaining words
                Err(e @ (CollaboratorError::Unavailable(_) | CollaboratorError::Timeout(_))) if answered == 0 => {
                    return Err(e);
                }
                Err(e) => debug!("Skipping '{}': {}", word, e),
            }
        }

        if total > self.max_words {
            debug!("Checked {} of {} distinct words", self.max_words, total);
        }
        Ok(suggestions)
    }
}

#[derive(Deserialize)]
struct LanguageToolResponse {
    #[serde(default)]
    matches: Vec<LanguageToolMatch>,
}

#[derive(Deserialize)]
struct LanguageToolMatch {
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<LanguageToolReplacement>,
    rule: LanguageToolRule,
}

#[derive(Deserialize)]
struct LanguageToolReplacement {
    value: String,
}

#[derive(Deserialize)]
struct LanguageToolRule {
    #[serde(rename = "issueType", default)]
    issue_type: String,
}

/// Client of a LanguageTool server, used for Russian
pub struct LanguageToolChecker {
    endpoint: String,
    client: reqwest::Client,
    language: String,
}

impl LanguageToolChecker {
    /// Create a client for the server at `endpoint`
    pub fn new(endpoint: &str, config: &SpellingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.stage_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            language: "ru-RU".to_string(),
        }
    }
}

#[async_trait]
impl SpellChecker for LanguageToolChecker {
    async fn check(&self, text: &str, _script: Script) -> Result<Vec<SpellingSuggestion>, CollaboratorError> {
        let url = format!("{}/v2/check", self.endpoint);
        let response = self
            .client
            .post(&url)
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout(format!("{}: {}", url, e))
                } else {
                    CollaboratorError::Unavailable(format!("{}: {}", url, e))
                }
            })?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Failed(format!("{} answered {}", url, response.status())));
        }

        let body = response
            .json::<LanguageToolResponse>()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
        Ok(misspellings(text, body.matches))
    }
}

/// Keep the misspelling matches, converting character offsets to bytes
fn misspellings(text: &str, matches: Vec<LanguageToolMatch>) -> Vec<SpellingSuggestion> {
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    matches
        .into_iter()
        .filter(|m| m.rule.issue_type == "misspelling")
        .filter_map(|m| {
            let start = *boundaries.get(m.offset)?;
            let end = *boundaries.get(m.offset + m.length)?;
            Some(SpellingSuggestion {
                offset: start,
                word: text.get(start..end)?.to_string(),
                suggestions: m.replacements.into_iter().take(3).map(|r| r.value).collect(),
            })
        })
        .collect()
}

/// In-memory spellchecker for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct MockSpellChecker {
    misspelled: HashMap<String, Vec<String>>,
    unavailable: bool,
    calls: Arc<Mutex<Vec<Script>>>,
}

impl MockSpellChecker {
    /// Checker that accepts every word
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag `word` and offer `suggestions`
    pub fn with_misspelling(mut self, word: &str, suggestions: &[&str]) -> Self {
        self.misspelled.insert(
            word.to_lowercase(),
            suggestions.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Checker whose service cannot be reached
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Scripts of the calls made so far
    pub fn calls(&self) -> Vec<Script> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpellChecker for MockSpellChecker {
    async fn check(&self, text: &str, script: Script) -> Result<Vec<SpellingSuggestion>, CollaboratorError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(script);
        }
        if self.unavailable {
            return Err(CollaboratorError::Unavailable("connection refused".to_string()));
        }

        Ok(distinct_words(text, 1)
            .into_iter()
            .filter_map(|(offset, word)| {
                self.misspelled.get(&word.to_lowercase()).map(|suggestions| SpellingSuggestion {
                    offset,
                    word: word.to_string(),
                    suggestions: suggestions.clone(),
                })
            })
            .collect())
    }
}

/// Turn spellchecker findings into `spelling` issues at `low` severity
///
/// Each issue points at the section holding the word; at most `max_issues`
/// are produced.
pub fn spelling_issues(
    text: &str,
    sections: &[Section],
    suggestions: &[SpellingSuggestion],
    max_issues: usize,
) -> Vec<ComplianceIssue> {
    suggestions
        .iter()
        .take(max_issues)
        .map(|s| {
            let description = describe(s);
            let mut issue = ComplianceIssue::new(
                IssueType::Spelling,
                Severity::Low,
                format!("Imloviy xato: {}", s.word),
                description,
            )
            .from_source(IssueSource::Spelling)
            .with_excerpt(context(text, s.offset, s.word.len()));

            if let Some(best) = s.suggestions.first() {
                issue = issue.with_suggestion(format!("To'g'ri yozilishi: {}", best));
            }
            if let Some((index, section)) = sections
                .iter()
                .enumerate()
                .find(|(_, section)| section.start <= s.offset && s.offset < section.end)
            {
                issue = issue.in_section(index, section.label);
            }
            issue
        })
        .collect()
}

fn describe(suggestion: &SpellingSuggestion) -> String {
    let word = &suggestion.word;
    if rules::is_mixed_script(word) {
        return format!("'{}' so'zida lotin va kirill harflari aralashgan", word);
    }
    match suggestion.suggestions.first() {
        Some(best) if word.contains('`') && !best.contains('`') => {
            format!("Tutuq belgisi noto'g'ri: '{}' o'rniga '{}'", word, best)
        }
        Some(best) => format!("'{}' so'zi noto'g'ri yozilgan, to'g'risi: '{}'", word, best),
        None => format!("'{}' so'zi lug'atda topilmadi", word),
    }
}

/// The line around a word
fn context(text: &str, offset: usize, len: usize) -> String {
    let end = (offset + len).min(text.len());
    let (Some(before), Some(after)) = (text.get(..offset), text.get(end..)) else {
        return String::new();
    };
    let start = before.rfind('\n').map_or(0, |i| i + 1);
    let stop = after.find('\n').map_or(text.len(), |i| end + i);
    text.get(start..stop).unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shartnoma_domain::SectionLabel;

    #[test]
    fn test_distinct_words() {
        let words = distinct_words("Shartnoma shartnoma ko'rsatadi MChJ va 2024 ta'minot", 3);
        let found: Vec<&str> = words.iter().map(|(_, w)| *w).collect();
        assert_eq!(found, vec!["Shartnoma", "ko'rsatadi", "ta'minot"]);
        assert_eq!(words[1].0, "Shartnoma shartnoma ".len());
    }

    #[test]
    fn test_distinct_words_cyrillic() {
        let words = distinct_words("Договор оказания услуг ИНН", 3);
        let found: Vec<&str> = words.iter().map(|(_, w)| *w).collect();
        assert_eq!(found, vec!["Договор", "оказания", "услуг"]);
    }

    #[tokio::test]
    async fn test_mock_flags_configured_words() {
        let checker = MockSpellChecker::new().with_misspelling("shartnma", &["shartnoma"]);
        let text = "Ushbu shartnma tuzildi";
        let found = checker.check(text, Script::Latin).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].offset, 6);
        assert_eq!(found[0].suggestions, vec!["shartnoma"]);
        assert_eq!(checker.calls(), vec![Script::Latin]);
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let config = SpellingConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 500,
            ..SpellingConfig::default()
        };
        let checker = HttpSpellChecker::new(&config);
        let result = checker.check("Ushbu shartnoma tuzildi", Script::Latin).await;
        assert!(matches!(
            result,
            Err(CollaboratorError::Unavailable(_)) | Err(CollaboratorError::Timeout(_))
        ));
    }

    #[test]
    fn test_spelling_issues() {
        let text = "1. PREDMET\nIjrochi xizmat ko'rsatdi.\n2. NARX\nNarx belgilanadi.";
        let sections = vec![
            Section::new(SectionLabel::Subject, 0, 37, 0.9),
            Section::new(SectionLabel::Price, 37, text.len(), 0.9),
        ];
        let suggestions = vec![SpellingSuggestion {
            offset: text.find("ko'rsatdi").unwrap(),
            word: "ko'rsatdi".to_string(),
            suggestions: vec!["ko'rsatadi".to_string()],
        }];

        let issues = spelling_issues(text, &sections, &suggestions, 10);

        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.issue_type, IssueType::Spelling);
        assert_eq!(issue.severity, Severity::Low);
        assert_eq!(issue.source, IssueSource::Spelling);
        assert_eq!(issue.suggestion.as_deref(), Some("To'g'ri yozilishi: ko'rsatadi"));
        assert_eq!(issue.excerpt.as_deref(), Some("Ijrochi xizmat ko'rsatdi."));
        assert_eq!(issue.section.map(|s| s.label), Some(SectionLabel::Subject));
    }

    #[test]
    fn test_language_tool_offsets_are_characters() {
        let text = "Настоящий даговор заключен";
        let matches = vec![
            LanguageToolMatch {
                offset: 10,
                length: 7,
                replacements: vec![LanguageToolReplacement {
                    value: "договор".to_string(),
                }],
                rule: LanguageToolRule {
                    issue_type: "misspelling".to_string(),
                },
            },
            LanguageToolMatch {
                offset: 0,
                length: 9,
                replacements: Vec::new(),
                rule: LanguageToolRule {
                    issue_type: "style".to_string(),
                },
            },
            LanguageToolMatch {
                offset: 100,
                length: 3,
                replacements: Vec::new(),
                rule: LanguageToolRule {
                    issue_type: "misspelling".to_string(),
                },
            },
        ];

        let found = misspellings(text, matches);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].word, "даговор");
        assert_eq!(found[0].offset, text.find("даговор").unwrap());
        assert_eq!(found[0].suggestions, vec!["договор"]);
    }

    #[test]
    fn test_language_tool_response_shape() {
        let body = r#"{"matches":[{"offset":0,"length":3,"replacements":[{"value":"для"}],"rule":{"id":"MORFOLOGIK_RULE_RU_RU","issueType":"misspelling"}}]}"#;
        let parsed: LanguageToolResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.matches[0].rule.issue_type, "misspelling");
        assert_eq!(parsed.matches[0].replacements[0].value, "для");
    }

    #[tokio::test]
    async fn test_unreachable_language_tool() {
        let config = SpellingConfig {
            stage_timeout_ms: 500,
            ..SpellingConfig::default()
        };
        let checker = LanguageToolChecker::new("http://127.0.0.1:9", &config);
        let result = checker.check("Текст", Script::Cyrillic).await;
        assert!(matches!(
            result,
            Err(CollaboratorError::Unavailable(_)) | Err(CollaboratorError::Timeout(_))
        ));
    }

    #[test]
    fn test_rule_issue_descriptions() {
        let mixed = SpellingSuggestion {
            offset: 0,
            word: "Shartnomа".to_string(),
            suggestions: vec!["Shartnoma".to_string()],
        };
        let backtick = SpellingSuggestion {
            offset: "Shartnomа ".len(),
            word: "ko`rsatadi".to_string(),
            suggestions: vec!["ko'rsatadi".to_string()],
        };
        let issues = spelling_issues("Shartnomа ko`rsatadi", &[], &[mixed, backtick], 10);
        assert!(issues[0].description.contains("aralashgan"));
        assert!(issues[1].description.starts_with("Tutuq belgisi"));
    }

    #[test]
    fn test_spelling_issues_are_capped() {
        let suggestions: Vec<SpellingSuggestion> = (0..5)
            .map(|i| SpellingSuggestion {
                offset: i,
                word: "x".to_string(),
                suggestions: Vec::new(),
            })
            .collect();
        let issues = spelling_issues("xxxxx", &[], &suggestions, 2);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].suggestion.is_none());
        assert!(issues[0].section.is_none());
    }
}
