//! Issue module - compliance issues, their severity and legal citations

use crate::section::SectionLabel;
use serde::{Deserialize, Serialize};

/// Severity of an issue, ordered from harmless to blocking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational remark
    Info,
    /// Minor problem
    Low,
    /// Should be fixed
    Medium,
    /// Serious problem
    High,
    /// Contract is legally defective
    Critical,
}

impl Severity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Parse a severity name (accepts "minor" for `Low`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" | "information" => Some(Severity::Info),
            "low" | "minor" => Some(Severity::Low),
            "medium" | "moderate" => Some(Severity::Medium),
            "high" | "major" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Uzbek label used in summaries and tables
    pub fn label_uz(&self) -> &'static str {
        match self {
            Severity::Info => "Ma'lumot",
            Severity::Low => "Past",
            Severity::Medium => "O'rta",
            Severity::High => "Yuqori",
            Severity::Critical => "Jiddiy",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid severity: {}", s))
    }
}

/// Kind of problem an issue describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// A section required for the contract type is absent
    MissingMandatorySection,
    /// A clause contradicts a statute (prohibited waiver, penalty over the cap, ...)
    UnlawfulClause,
    /// A clause favours one party only
    OneSided,
    /// Vague or unparseable wording
    AmbiguousTerm,
    /// A mandatory detail (date, INN, amount) is missing
    MissingInfo,
    /// Spelling error reported by the spellchecker
    Spelling,
    /// Problem with the document as a whole (e.g. not a contract)
    Structural,
    /// Clauses contradict each other
    Conflict,
    /// Anything else
    Other,
}

impl IssueType {
    /// All issue types
    pub const ALL: [IssueType; 9] = [
        IssueType::MissingMandatorySection,
        IssueType::UnlawfulClause,
        IssueType::OneSided,
        IssueType::AmbiguousTerm,
        IssueType::MissingInfo,
        IssueType::Spelling,
        IssueType::Structural,
        IssueType::Conflict,
        IssueType::Other,
    ];

    /// Get the issue type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::MissingMandatorySection => "missing_mandatory_section",
            IssueType::UnlawfulClause => "unlawful_clause",
            IssueType::OneSided => "one_sided",
            IssueType::AmbiguousTerm => "ambiguous_term",
            IssueType::MissingInfo => "missing_info",
            IssueType::Spelling => "spelling",
            IssueType::Structural => "structural",
            IssueType::Conflict => "conflict",
            IssueType::Other => "other",
        }
    }

    /// Parse an issue type name, accepting the short aliases models tend to emit
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "missing_mandatory_section" | "missing_section" | "missing_clause" => {
                Some(IssueType::MissingMandatorySection)
            }
            "unlawful_clause" | "illegal" | "invalid" | "unlawful" => Some(IssueType::UnlawfulClause),
            "one_sided" => Some(IssueType::OneSided),
            "ambiguous_term" | "ambiguous" | "unclear" => Some(IssueType::AmbiguousTerm),
            "missing_info" => Some(IssueType::MissingInfo),
            "spelling" => Some(IssueType::Spelling),
            "structural" | "format" => Some(IssueType::Structural),
            "conflict" => Some(IssueType::Conflict),
            "other" => Some(IssueType::Other),
            _ => None,
        }
    }
}

impl std::str::FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid issue type: {}", s))
    }
}

/// Which stage produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSource {
    /// Deterministic rule engine
    Rules,
    /// Generative model review
    Llm,
    /// Spellchecking collaborator
    Spelling,
}

/// Reference to a statute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LawCitation {
    /// Full law name
    pub law_name: String,
    /// Article number as written ("356")
    pub article: String,
}

impl LawCitation {
    /// Create a citation
    pub fn new(law_name: impl Into<String>, article: impl Into<String>) -> Self {
        Self {
            law_name: law_name.into(),
            article: article.into(),
        }
    }
}

impl std::fmt::Display for LawCitation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}-modda", self.law_name, self.article)
    }
}

/// Reference to a section of the analyzed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionRef {
    /// Index into the section list
    pub index: usize,
    /// Label of that section
    pub label: SectionLabel,
}

/// One detected problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    /// Kind of problem
    pub issue_type: IssueType,

    /// Severity
    pub severity: Severity,

    /// Short title
    pub title: String,

    /// Human-readable description
    pub description: String,

    /// Section the issue was found in
    pub section: Option<SectionRef>,

    /// Statute the issue relies on
    pub citation: Option<LawCitation>,

    /// Suggested remediation text
    pub suggestion: Option<String>,

    /// Offending excerpt of the contract text
    pub excerpt: Option<String>,

    /// Stage that produced the issue
    pub source: IssueSource,

    /// Set by a human reviewer after the run
    #[serde(default)]
    pub resolved: bool,
}

impl ComplianceIssue {
    /// Create a rule-engine issue
    pub fn new(
        issue_type: IssueType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            severity,
            title: title.into(),
            description: description.into(),
            section: None,
            citation: None,
            suggestion: None,
            excerpt: None,
            source: IssueSource::Rules,
            resolved: false,
        }
    }

    /// Attach a section reference
    pub fn in_section(mut self, index: usize, label: SectionLabel) -> Self {
        self.section = Some(SectionRef { index, label });
        self
    }

    /// Attach a law citation
    pub fn with_citation(mut self, citation: LawCitation) -> Self {
        self.citation = Some(citation);
        self
    }

    /// Attach a suggested remediation
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach the offending excerpt
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    /// Override the producing stage
    pub fn from_source(mut self, source: IssueSource) -> Self {
        self.source = source;
        self
    }

    /// Check the issue invariants
    ///
    /// An issue must always be explainable on its own: with or without a
    /// citation it needs a non-empty title or description.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() && self.description.trim().is_empty() {
            return Err("Issue must carry a title or a description".to_string());
        }
        if let Some(citation) = &self.citation {
            if citation.law_name.trim().is_empty() {
                return Err("Citation law name must not be empty".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("minor"), Some(Severity::Low));
        assert_eq!(Severity::parse(" HIGH "), Some(Severity::High));
        assert_eq!(Severity::parse("severe"), None);
    }

    #[test]
    fn test_issue_type_round_trip() {
        for t in IssueType::ALL {
            assert_eq!(IssueType::parse(t.as_str()), Some(t));
        }
        assert_eq!(IssueType::parse("illegal"), Some(IssueType::UnlawfulClause));
    }

    #[test]
    fn test_issue_validate_requires_text() {
        let issue = ComplianceIssue::new(IssueType::Other, Severity::Low, "", " ");
        assert!(issue.validate().is_err());

        let issue = ComplianceIssue::new(IssueType::Other, Severity::Low, "", "Tavsif");
        assert!(issue.validate().is_ok());
    }

    #[test]
    fn test_issue_builder() {
        let issue = ComplianceIssue::new(
            IssueType::UnlawfulClause,
            Severity::High,
            "Penya chegarasi",
            "Penya 60%",
        )
        .in_section(3, SectionLabel::Liability)
        .with_citation(LawCitation::new("Fuqarolik kodeksi", "327"))
        .from_source(IssueSource::Llm);

        assert_eq!(issue.section.unwrap().label, SectionLabel::Liability);
        assert_eq!(issue.citation.as_ref().unwrap().article, "327");
        assert_eq!(issue.source, IssueSource::Llm);
        assert!(!issue.resolved);
    }
}
