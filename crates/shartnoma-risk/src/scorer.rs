//! Deterministic scoring of an issue list and the sections it was found in
//!
//! Every score starts at 100 and loses points. Issues are grouped by type and
//! each group is sorted by penalty, largest first; the n-th issue of a group
//! counts at `dampening^(n-1)`. The result therefore does not depend on the
//! order of the input, and adding an issue never raises a score.

use crate::config::RiskConfig;
use crate::level::RiskLevel;
use crate::recommendations::recommendations;
use shartnoma_compliance::checks::{normalize, VAGUE_TERMS};
use shartnoma_domain::{
    ComplianceIssue, ContractMetadata, IssueType, PartyRole, ScoreBreakdown, Section, SectionLabel,
};
use std::collections::BTreeMap;
use tracing::debug;

const MISSING_NUMBER_PENALTY: f64 = 5.0;
const MISSING_DATE_PENALTY: f64 = 10.0;
const UNIDENTIFIED_PARTY_PENALTY: f64 = 10.0;
const SHORT_SECTION_PENALTY: f64 = 3.0;
const VAGUE_TERM_PENALTY: f64 = 2.0;

/// Everything the scorer looks at
#[derive(Debug, Clone, Copy)]
pub struct RiskInput<'a> {
    /// Full extracted text
    pub text: &'a str,
    /// Sections in source order
    pub sections: &'a [Section],
    /// Recovered metadata
    pub metadata: &'a ContractMetadata,
    /// Issues from every stage
    pub issues: &'a [ComplianceIssue],
    /// Sections the contract type requires
    pub required: &'a [SectionLabel],
}

/// Scores and recommendations for one contract
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Risk score, higher is safer
    pub risk_score: u8,
    /// Compliance score, statutory issues only
    pub compliance_score: u8,
    /// Sub-scores and their blend
    pub scores: ScoreBreakdown,
    /// Band of the risk score
    pub level: RiskLevel,
    /// Recommendations, most important first
    pub recommendations: Vec<String>,
}

/// Risk scorer
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: RiskConfig,
}

impl RiskScorer {
    /// Create a scorer with the given configuration
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Score a contract
    pub fn assess(&self, input: &RiskInput<'_>) -> RiskAssessment {
        let risk = 100.0 - self.dampened_penalty(input.issues, |_| true);
        let compliance = 100.0 - self.dampened_penalty(input.issues, |t| self.config.is_statutory(t));
        let completeness = completeness(input.sections, input.required);
        let clarity = self.clarity(input.text, input.sections, input.metadata);
        let balance = self.balance(input.issues);

        let weights = &self.config.weights;
        let overall = compliance.clamp(0.0, 100.0) * weights.compliance
            + completeness * weights.completeness
            + clarity * weights.clarity
            + balance * weights.balance;

        let risk_score = to_score(risk);
        let scores = ScoreBreakdown {
            compliance: to_score(compliance),
            completeness: to_score(completeness),
            clarity: to_score(clarity),
            balance: to_score(balance),
            overall: to_score(overall),
        };

        debug!(
            risk_score,
            compliance = scores.compliance,
            completeness = scores.completeness,
            clarity = scores.clarity,
            balance = scores.balance,
            issues = input.issues.len(),
            "Scored contract"
        );

        RiskAssessment {
            risk_score,
            compliance_score: scores.compliance,
            scores,
            level: RiskLevel::from_score(risk_score),
            recommendations: recommendations(input.issues, risk_score),
        }
    }

    /// Risk score of an issue list alone
    pub fn risk_score(&self, issues: &[ComplianceIssue]) -> u8 {
        to_score(100.0 - self.dampened_penalty(issues, |_| true))
    }

    /// Compliance score of an issue list alone
    pub fn compliance_score(&self, issues: &[ComplianceIssue]) -> u8 {
        to_score(100.0 - self.dampened_penalty(issues, |t| self.config.is_statutory(t)))
    }

    /// Total penalty of the unresolved issues whose type passes `counts`
    pub fn dampened_penalty(&self, issues: &[ComplianceIssue], counts: impl Fn(IssueType) -> bool) -> f64 {
        let mut groups: BTreeMap<IssueType, Vec<f64>> = BTreeMap::new();
        for issue in issues.iter().filter(|i| !i.resolved && counts(i.issue_type)) {
            groups
                .entry(issue.issue_type)
                .or_default()
                .push(self.config.penalties.for_severity(issue.severity));
        }

        groups
            .into_values()
            .map(|mut penalties| {
                penalties.sort_by(|a, b| b.total_cmp(a));
                let mut weight = 1.0;
                let mut sum = 0.0;
                for penalty in penalties {
                    sum += penalty * weight;
                    weight *= self.config.dampening;
                }
                sum
            })
            .sum()
    }

    fn clarity(&self, text: &str, sections: &[Section], metadata: &ContractMetadata) -> f64 {
        let mut score = 100.0;

        if metadata.number.is_none() {
            score -= MISSING_NUMBER_PENALTY;
        }
        if metadata.date.is_none() {
            score -= MISSING_DATE_PENALTY;
        }
        for role in [PartyRole::First, PartyRole::Second] {
            if !metadata.party(role).is_some_and(|p| p.is_identified()) {
                score -= UNIDENTIFIED_PARTY_PENALTY;
            }
        }

        for section in sections {
            if matches!(section.label, SectionLabel::Header | SectionLabel::Signatures) {
                continue;
            }
            let body = section.text(text).trim();
            if body.is_empty() {
                continue;
            }
            if body.chars().count() < self.config.short_section_chars {
                score -= SHORT_SECTION_PENALTY;
            }
            let lower = normalize(body);
            let vague = VAGUE_TERMS.iter().filter(|term| lower.contains(**term)).count();
            score -= vague as f64 * VAGUE_TERM_PENALTY;
        }

        score.clamp(0.0, 100.0)
    }

    fn balance(&self, issues: &[ComplianceIssue]) -> f64 {
        let one_sided = issues
            .iter()
            .filter(|i| !i.resolved && i.issue_type == IssueType::OneSided)
            .count();
        (100.0 - one_sided as f64 * self.config.one_sided_penalty).clamp(0.0, 100.0)
    }
}

/// Relative importance of a section when measuring completeness
pub fn section_weight(label: SectionLabel) -> f64 {
    match label {
        SectionLabel::Parties | SectionLabel::Subject | SectionLabel::Price => 10.0,
        SectionLabel::Term
        | SectionLabel::Obligations
        | SectionLabel::Liability
        | SectionLabel::Requisites => 8.0,
        SectionLabel::Warranty | SectionLabel::Delivery | SectionLabel::Quality => 6.0,
        SectionLabel::ForceMajeure | SectionLabel::Disputes | SectionLabel::Rights => 4.0,
        SectionLabel::Termination => 3.0,
        SectionLabel::Confidentiality | SectionLabel::Other => 2.0,
        SectionLabel::Header | SectionLabel::Signatures => 5.0,
    }
}

/// Weighted share of the required sections that are present, 0-100
pub fn completeness(sections: &[Section], required: &[SectionLabel]) -> f64 {
    let total: f64 = required.iter().map(|l| section_weight(*l)).sum();
    if total == 0.0 {
        return 100.0;
    }
    let found: f64 = required
        .iter()
        .filter(|label| sections.iter().any(|s| s.label == **label))
        .map(|l| section_weight(*l))
        .sum();
    (found / total * 100.0).clamp(0.0, 100.0)
}

fn to_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use shartnoma_domain::Severity;

    fn issue(issue_type: IssueType, severity: Severity) -> ComplianceIssue {
        ComplianceIssue::new(issue_type, severity, "t", "d")
    }

    #[test]
    fn test_no_issues_scores_full() {
        let scorer = RiskScorer::default();
        assert_eq!(scorer.risk_score(&[]), 100);
        assert_eq!(scorer.compliance_score(&[]), 100);
    }

    #[test]
    fn test_repeated_type_is_dampened() {
        let scorer = RiskScorer::default();
        let issues = vec![
            issue(IssueType::UnlawfulClause, Severity::High),
            issue(IssueType::UnlawfulClause, Severity::High),
            issue(IssueType::UnlawfulClause, Severity::High),
        ];
        // 30 + 15 + 7.5
        assert_eq!(scorer.dampened_penalty(&issues, |_| true), 52.5);
        assert_eq!(scorer.risk_score(&issues), 48);

        let mild = RiskScorer::new(RiskConfig {
            dampening: 0.9,
            ..RiskConfig::default()
        });
        assert!(mild.risk_score(&issues) < 48);
    }

    #[test]
    fn test_largest_penalty_counts_in_full() {
        let scorer = RiskScorer::default();
        let issues = vec![
            issue(IssueType::UnlawfulClause, Severity::Low),
            issue(IssueType::UnlawfulClause, Severity::Critical),
        ];
        // 40 + 5 * 0.5
        assert_eq!(scorer.dampened_penalty(&issues, |_| true), 42.5);
    }

    #[test]
    fn test_distinct_types_are_not_dampened() {
        let scorer = RiskScorer::default();
        let issues = vec![
            issue(IssueType::MissingMandatorySection, Severity::High),
            issue(IssueType::UnlawfulClause, Severity::High),
        ];
        assert_eq!(scorer.risk_score(&issues), 40);
    }

    #[test]
    fn test_compliance_ignores_stylistic_types() {
        let scorer = RiskScorer::default();
        let issues = vec![
            issue(IssueType::Spelling, Severity::Low),
            issue(IssueType::AmbiguousTerm, Severity::Low),
            issue(IssueType::OneSided, Severity::Medium),
        ];
        assert_eq!(scorer.compliance_score(&issues), 100);
        assert_eq!(scorer.risk_score(&issues), 75);
    }

    #[test]
    fn test_resolved_issues_do_not_count() {
        let scorer = RiskScorer::default();
        let mut resolved = issue(IssueType::UnlawfulClause, Severity::Critical);
        resolved.resolved = true;
        assert_eq!(scorer.risk_score(&[resolved]), 100);
    }

    #[test]
    fn test_scores_clamp_at_zero() {
        let scorer = RiskScorer::default();
        let issues: Vec<_> = IssueType::ALL
            .iter()
            .map(|t| issue(*t, Severity::Critical))
            .collect();
        assert_eq!(scorer.risk_score(&issues), 0);
        assert_eq!(scorer.compliance_score(&issues), 0);
    }

    #[test]
    fn test_completeness_is_weighted() {
        use SectionLabel::*;
        let required = [Parties, Subject, Confidentiality];
        let sections = vec![Section::new(Parties, 0, 1, 1.0), Section::new(Subject, 1, 2, 1.0)];
        // 20 of 22
        assert_eq!(to_score(completeness(&sections, &required)), 91);
        assert_eq!(completeness(&sections, &[]), 100.0);
        assert_eq!(completeness(&[], &required), 0.0);
    }

    #[test]
    fn test_to_score_rounds_and_clamps() {
        assert_eq!(to_score(47.5), 48);
        assert_eq!(to_score(-12.0), 0);
        assert_eq!(to_score(140.0), 100);
    }
}
