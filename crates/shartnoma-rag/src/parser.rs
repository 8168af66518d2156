//! Parse model output into compliance issues

use crate::error::RagError;
use serde_json::{Map, Value};
use shartnoma_domain::{ComplianceIssue, IssueSource, IssueType, LawCitation, Severity};
use tracing::warn;

/// What survived validation of one model answer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReview {
    /// Valid issues, in answer order
    pub issues: Vec<ComplianceIssue>,
    /// Free-text assessment of the section
    pub summary: Option<String>,
    /// Why each rejected entry was dropped
    pub rejected: Vec<String>,
}

/// Parse a model answer
///
/// The answer is either an object with an `issues` array (and optional
/// `summary`) or a bare array. Entries that break the schema are dropped and
/// reported in [`ParsedReview::rejected`]; only an answer that is not JSON, or
/// holds no issue list at all, is an error.
pub fn parse_llm_response(response: &str) -> Result<ParsedReview, RagError> {
    let json_str = extract_json(response)?;
    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| RagError::SchemaViolation(format!("JSON parse error: {}", e)))?;

    let (items, summary) = match &json {
        Value::Array(items) => (items, None),
        Value::Object(obj) => {
            let items = obj
                .get("issues")
                .and_then(Value::as_array)
                .ok_or_else(|| RagError::SchemaViolation("Expected an 'issues' array".to_string()))?;
            let summary = obj
                .get("summary")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            (items, summary)
        }
        _ => {
            return Err(RagError::SchemaViolation(
                "Expected a JSON object or array".to_string(),
            ))
        }
    };

    let mut review = ParsedReview {
        summary,
        ..ParsedReview::default()
    };
    for (idx, item) in items.iter().enumerate() {
        match parse_issue_json(item).and_then(|issue| issue.validate().map(|_| issue)) {
            Ok(issue) => review.issues.push(issue),
            Err(e) => {
                warn!("Dropping model issue {}: {}", idx, e);
                review.rejected.push(format!("issue {}: {}", idx, e));
            }
        }
    }

    Ok(review)
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<String, RagError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(RagError::SchemaViolation("Empty code block".to_string()));
        }
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        Ok(lines[1..end].join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn required_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing or invalid '{}'", key))
}

fn optional_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a single issue from JSON
fn parse_issue_json(json: &Value) -> Result<ComplianceIssue, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Issue is not a JSON object".to_string())?;

    let issue_type = required_str(obj, "issue_type")?;
    let issue_type = IssueType::parse(issue_type).ok_or_else(|| format!("Unknown issue_type '{}'", issue_type))?;

    let severity = required_str(obj, "severity")?;
    let severity = Severity::parse(severity).ok_or_else(|| format!("Unknown severity '{}'", severity))?;

    let title = required_str(obj, "title")?;
    let description = required_str(obj, "description")?;

    let mut issue = ComplianceIssue::new(issue_type, severity, title.trim(), description.trim())
        .from_source(IssueSource::Llm);

    if let Some(law_name) = optional_str(obj, "law_name") {
        let article = optional_str(obj, "article").unwrap_or_default();
        issue = issue.with_citation(LawCitation::new(law_name, article));
    }
    if let Some(suggestion) = optional_str(obj, "suggestion") {
        issue = issue.with_suggestion(suggestion);
    }
    if let Some(excerpt) = optional_str(obj, "excerpt") {
        issue = issue.with_excerpt(excerpt);
    }

    Ok(issue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_with_summary() {
        let response = r#"{
            "summary": "Band qisman mos",
            "issues": [
                {
                    "issue_type": "unlawful_clause",
                    "severity": "high",
                    "title": "Penya chegarasi",
                    "description": "Penya 50% dan oshadi",
                    "law_name": "Fuqarolik kodeksi",
                    "article": "327",
                    "suggestion": "Penyani kamaytiring"
                }
            ]
        }"#;

        let review = parse_llm_response(response).unwrap();
        assert_eq!(review.summary.as_deref(), Some("Band qisman mos"));
        assert_eq!(review.issues.len(), 1);
        let issue = &review.issues[0];
        assert_eq!(issue.issue_type, IssueType::UnlawfulClause);
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.source, IssueSource::Llm);
        assert_eq!(issue.citation.as_ref().map(|c| c.article.as_str()), Some("327"));
        assert_eq!(issue.suggestion.as_deref(), Some("Penyani kamaytiring"));
        assert!(review.rejected.is_empty());
    }

    #[test]
    fn test_parse_bare_array_in_markdown() {
        let response = "```json\n[{\"issue_type\": \"unclear\", \"severity\": \"minor\", \"title\": \"Noaniq\", \"description\": \"...\"}]\n```";
        let review = parse_llm_response(response).unwrap();
        assert_eq!(review.issues[0].issue_type, IssueType::AmbiguousTerm);
        assert_eq!(review.issues[0].severity, Severity::Low);
        assert_eq!(review.summary, None);
    }

    #[test]
    fn test_missing_severity_drops_only_that_issue() {
        let response = r#"{"issues": [
            {"issue_type": "one_sided", "severity": "medium", "title": "A", "description": "a"},
            {"issue_type": "one_sided", "title": "B", "description": "b"},
            {"issue_type": "conflict", "severity": "low", "title": "C", "description": "c"}
        ]}"#;

        let review = parse_llm_response(response).unwrap();
        let titles: Vec<&str> = review.issues.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
        assert_eq!(review.rejected.len(), 1);
        assert!(review.rejected[0].contains("severity"));
    }

    #[test]
    fn test_unknown_values_and_empty_text_are_rejected() {
        let response = r#"[
            {"issue_type": "weird", "severity": "high", "title": "A", "description": "a"},
            {"issue_type": "other", "severity": "urgent", "title": "B", "description": "b"},
            {"issue_type": "other", "severity": "low", "title": " ", "description": ""},
            "not an object"
        ]"#;
        let review = parse_llm_response(response).unwrap();
        assert!(review.issues.is_empty());
        assert_eq!(review.rejected.len(), 4);
    }

    #[test]
    fn test_not_json_is_an_error() {
        let err = parse_llm_response("Kechirasiz, javob bera olmayman").unwrap_err();
        assert!(err.is_schema_error());
        assert!(parse_llm_response(r#"{"summary": "x"}"#).is_err());
        assert!(parse_llm_response("42").is_err());
    }

    #[test]
    fn test_extract_json_without_closing_fence() {
        let json = extract_json("```\n[]").unwrap();
        assert_eq!(json, "[]");
    }
}
