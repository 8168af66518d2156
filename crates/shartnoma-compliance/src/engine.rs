//! Compliance engine

use crate::checks::{
    excerpt, format_rate, normalize, penalty_rates, penalty_severity, ONE_SIDED_PATTERNS,
    VAGUE_TERMS,
};
use crate::config::ComplianceConfig;
use crate::error::ComplianceError;
use crate::rules::{
    mandatory_rule_for, rules_for, LegalRule, RuleCheck, CIVIL_CODE, GENERAL_CONTRACT_ARTICLE,
};
use shartnoma_domain::{
    ComplianceIssue, ContractMetadata, ContractType, IssueType, Language, LawCitation, PartyRole,
    Section, SectionLabel, Severity,
};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Everything the engine looks at
#[derive(Debug, Clone, Copy)]
pub struct ComplianceInput<'a> {
    /// Full extracted text the sections point into
    pub text: &'a str,
    /// Sections in source order
    pub sections: &'a [Section],
    /// Extracted metadata
    pub metadata: &'a ContractMetadata,
    /// Contract type
    pub contract_type: ContractType,
    /// Language of the text
    pub language: Language,
    /// Whether the text reads as a contract
    pub is_contract: bool,
}

/// A rule that could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    /// Rule identifier
    pub rule_id: String,
    /// Error text
    pub message: String,
}

/// Engine output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplianceReport {
    /// Issues in evaluation order
    pub issues: Vec<ComplianceIssue>,
    /// Rules that failed and were downgraded to `ambiguous_term` issues
    pub failures: Vec<RuleFailure>,
}

/// Rule-based compliance checks
///
/// A pure function of its input: no I/O, no hidden state, the same input always
/// yields the same report.
#[derive(Debug, Clone, Default)]
pub struct ComplianceEngine {
    config: ComplianceConfig,
}

impl ComplianceEngine {
    /// Create an engine
    pub fn new(config: ComplianceConfig) -> Self {
        Self { config }
    }

    /// Engine configuration
    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    /// Check a contract
    pub fn check(&self, input: &ComplianceInput<'_>) -> ComplianceReport {
        let mut report = ComplianceReport::default();

        if !input.is_contract {
            debug!("Text is not a contract, rules skipped");
            report.issues.push(not_a_contract());
            return report;
        }

        let missing = self.check_missing_sections(input, &mut report.issues);

        for rule in rules_for(input.contract_type).filter(|r| self.config.is_enabled(r.id)) {
            match self.evaluate_rule(rule, input, &missing) {
                Ok(issues) => report.issues.extend(issues),
                Err(e) => {
                    warn!("Rule {} failed: {}", rule.id, e);
                    report.issues.push(
                        ComplianceIssue::new(
                            IssueType::AmbiguousTerm,
                            Severity::Low,
                            format!("Qoida tekshirilmadi: {}", rule.title),
                            format!("{} qoidasini tekshirib bo'lmadi: {}", rule.id, e),
                        )
                        .with_citation(rule.citation())
                        .with_suggestion("Bandni aniq va bir xil formatda yozing"),
                    );
                    report.failures.push(RuleFailure {
                        rule_id: rule.id.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if self.config.check_one_sided {
            report.issues.extend(check_one_sided(input));
        }
        if self.config.check_vague_terms {
            report.issues.extend(check_vague_terms(input));
        }
        if self.config.check_metadata {
            report.issues.extend(check_metadata(input.metadata, input.contract_type));
        }

        debug!(
            "Compliance: {} issues, {} rule failures",
            report.issues.len(),
            report.failures.len()
        );
        report
    }

    /// One `missing_mandatory_section` issue per absent required label
    ///
    /// Labels come from the contract type's required list and from enabled
    /// mandatory rules. Returns the labels reported.
    fn check_missing_sections(
        &self,
        input: &ComplianceInput<'_>,
        issues: &mut Vec<ComplianceIssue>,
    ) -> BTreeSet<SectionLabel> {
        let present: BTreeSet<SectionLabel> = input.sections.iter().map(|s| s.label).collect();
        let required = self.config.required_for(input.contract_type);

        let mut candidates: Vec<SectionLabel> = required.to_vec();
        for rule in rules_for(input.contract_type)
            .filter(|r| r.check == RuleCheck::Mandatory && self.config.is_enabled(r.id))
        {
            if let Some(label) = rule.section {
                if !candidates.contains(&label) {
                    candidates.push(label);
                }
            }
        }

        let mut missing = BTreeSet::new();
        for label in candidates {
            if present.contains(&label) {
                continue;
            }
            let rule = mandatory_rule_for(input.contract_type, label)
                .filter(|r| self.config.is_enabled(r.id));
            let required_severity = if required.contains(&label) {
                Severity::High
            } else {
                Severity::Info
            };
            let severity = rule
                .map(|r| r.severity.max(required_severity))
                .unwrap_or(required_severity);
            let citation = rule
                .map(LegalRule::citation)
                .unwrap_or_else(|| LawCitation::new(CIVIL_CODE, GENERAL_CONTRACT_ARTICLE));

            let name = label.title_uz();
            issues.push(
                ComplianceIssue::new(
                    IssueType::MissingMandatorySection,
                    severity,
                    format!("Yetishmayotgan bo'lim: {}", name),
                    format!("Shartnomada '{}' bo'limi topilmadi", name),
                )
                .with_citation(citation)
                .with_suggestion(format!("'{}' bo'limini qo'shing", name)),
            );
            missing.insert(label);
        }
        missing
    }

    fn evaluate_rule(
        &self,
        rule: &LegalRule,
        input: &ComplianceInput<'_>,
        missing: &BTreeSet<SectionLabel>,
    ) -> Result<Vec<ComplianceIssue>, ComplianceError> {
        match rule.check {
            RuleCheck::Mandatory => mandatory(rule, input),
            RuleCheck::Recommended => Ok(recommended(rule, input, missing)),
            RuleCheck::Prohibited => prohibited(rule, input),
            RuleCheck::PenaltyCap => self.penalty_cap(rule, input),
            RuleCheck::DocumentForm => Ok(document_form(rule, input)),
        }
    }

    fn penalty_cap(
        &self,
        rule: &LegalRule,
        input: &ComplianceInput<'_>,
    ) -> Result<Vec<ComplianceIssue>, ComplianceError> {
        let cap = self.config.penalty_cap_percent;
        let mut issues = Vec::new();

        for (index, section, text) in target_sections(rule, input)? {
            for line in text.lines() {
                let lower = normalize(line);
                if !rule.keywords.iter().any(|k| lower.contains(k)) {
                    continue;
                }
                let rates = penalty_rates(line, input.metadata.total_amount)?;
                let worst = rates.into_iter().fold(None, |acc: Option<f64>, r| {
                    Some(acc.map_or(r, |a| a.max(r)))
                });
                let Some(rate) = worst else { continue };
                let Some(severity) = penalty_severity(rate, cap) else {
                    continue;
                };

                issues.push(
                    ComplianceIssue::new(
                        IssueType::UnlawfulClause,
                        severity,
                        rule.title,
                        format!(
                            "Penya {}% qonunda belgilangan {}% chegarasidan oshadi",
                            format_rate(rate),
                            format_rate(cap)
                        ),
                    )
                    .in_section(index, section.label)
                    .with_citation(rule.citation())
                    .with_excerpt(excerpt(line))
                    .with_suggestion(format!(
                        "Penya miqdorini {}% dan oshirmang",
                        format_rate(cap)
                    )),
                );
            }
        }
        Ok(issues)
    }
}

fn not_a_contract() -> ComplianceIssue {
    ComplianceIssue::new(
        IssueType::Structural,
        Severity::Critical,
        "Hujjat shartnoma emas",
        "Matnda shartnoma belgilari (shartnoma so'zi, tomonlar, huquqiy shartlar) topilmadi",
    )
    .with_suggestion("Shartnoma matnini yuklang")
}

/// Sections a rule inspects with their text: the rule's label, or every section
/// when the label is absent
fn target_sections<'a>(
    rule: &LegalRule,
    input: &ComplianceInput<'a>,
) -> Result<Vec<(usize, &'a Section, &'a str)>, ComplianceError> {
    let labeled: Vec<(usize, &Section)> = input
        .sections
        .iter()
        .enumerate()
        .filter(|(_, s)| rule.section.is_some_and(|label| s.label == label))
        .collect();
    let chosen: Vec<(usize, &Section)> = if labeled.is_empty() {
        input.sections.iter().enumerate().collect()
    } else {
        labeled
    };

    chosen
        .into_iter()
        .map(|(index, section)| {
            section_text(input.text, section).map(|text| (index, section, text))
        })
        .collect()
}

fn section_text<'a>(text: &'a str, section: &Section) -> Result<&'a str, ComplianceError> {
    text.get(section.start..section.end).ok_or_else(|| {
        ComplianceError::SectionOutOfBounds(format!(
            "{} section {}..{} in a text of {} bytes",
            section.label.as_str(),
            section.start,
            section.end,
            text.len()
        ))
    })
}

fn mandatory(
    rule: &LegalRule,
    input: &ComplianceInput<'_>,
) -> Result<Vec<ComplianceIssue>, ComplianceError> {
    let Some(label) = rule.section else {
        return Ok(Vec::new());
    };
    // Absence is reported once by the missing-section check
    let Some((index, first)) = input.sections.iter().enumerate().find(|(_, s)| s.label == label)
    else {
        return Ok(Vec::new());
    };

    let mut found = false;
    for section in input.sections.iter().filter(|s| s.label == label) {
        let lower = normalize(section_text(input.text, section)?);
        if rule.keywords.iter().any(|k| lower.contains(k)) {
            found = true;
            break;
        }
    }
    if found {
        return Ok(Vec::new());
    }

    let hint = rule.keywords.iter().take(3).copied().collect::<Vec<_>>().join(", ");
    Ok(vec![ComplianceIssue::new(
        IssueType::MissingInfo,
        rule.severity,
        rule.title,
        rule.description,
    )
    .in_section(index, first.label)
    .with_citation(rule.citation())
    .with_suggestion(format!("Ushbu ma'lumotlarni qo'shing: {}", hint))])
}

fn recommended(
    rule: &LegalRule,
    input: &ComplianceInput<'_>,
    missing: &BTreeSet<SectionLabel>,
) -> Vec<ComplianceIssue> {
    let Some(label) = rule.section else {
        return Vec::new();
    };
    if missing.contains(&label) || input.sections.iter().any(|s| s.label == label) {
        return Vec::new();
    }
    vec![ComplianceIssue::new(IssueType::MissingInfo, rule.severity, rule.title, rule.description)
        .with_citation(rule.citation())
        .with_suggestion(format!("'{}' bo'limini qo'shish tavsiya etiladi", label.title_uz()))]
}

fn prohibited(
    rule: &LegalRule,
    input: &ComplianceInput<'_>,
) -> Result<Vec<ComplianceIssue>, ComplianceError> {
    let mut issues = Vec::new();
    for (index, section, text) in target_sections(rule, input)? {
        let hit = text.lines().find(|line| {
            let lower = normalize(line);
            rule.keywords.iter().any(|k| lower.contains(k))
        });
        if let Some(line) = hit {
            issues.push(
                ComplianceIssue::new(IssueType::UnlawfulClause, rule.severity, rule.title, rule.description)
                    .in_section(index, section.label)
                    .with_citation(rule.citation())
                    .with_excerpt(excerpt(line))
                    .with_suggestion("Bu bandni o'chirib tashlang yoki o'zgartiring"),
            );
        }
    }
    Ok(issues)
}

fn document_form(rule: &LegalRule, input: &ComplianceInput<'_>) -> Vec<ComplianceIssue> {
    let lower = normalize(input.text);
    if rule.keywords.iter().any(|k| lower.contains(k)) {
        return Vec::new();
    }
    vec![ComplianceIssue::new(IssueType::Structural, rule.severity, rule.title, rule.description)
        .with_citation(rule.citation())]
}

/// `one_sided` issues, one per section and pattern
fn check_one_sided(input: &ComplianceInput<'_>) -> Vec<ComplianceIssue> {
    let mut issues = Vec::new();
    for (index, section) in input.sections.iter().enumerate() {
        let text = section.text(input.text);
        for (pattern, title) in ONE_SIDED_PATTERNS {
            let Some(line) = text.lines().find(|l| normalize(l).contains(pattern)) else {
                continue;
            };
            issues.push(
                ComplianceIssue::new(
                    IssueType::OneSided,
                    Severity::Medium,
                    *title,
                    "Bu band bir tomonga ortiqcha ustunlik berishi mumkin",
                )
                .in_section(index, section.label)
                .with_excerpt(excerpt(line))
                .with_suggestion("Bandni ikkala tomon uchun muvozanatli qiling"),
            );
        }
    }
    issues
}

/// `ambiguous_term` issues for vague wording, one per section and term
fn check_vague_terms(input: &ComplianceInput<'_>) -> Vec<ComplianceIssue> {
    let mut issues = Vec::new();
    for (index, section) in input.sections.iter().enumerate() {
        let text = section.text(input.text);
        for term in VAGUE_TERMS {
            let Some(line) = text.lines().find(|l| normalize(l).contains(term)) else {
                continue;
            };
            issues.push(
                ComplianceIssue::new(
                    IssueType::AmbiguousTerm,
                    Severity::Low,
                    format!("Noaniq ibora: \"{}\"", term),
                    "Ibora turlicha talqin qilinishi mumkin",
                )
                .in_section(index, section.label)
                .with_excerpt(excerpt(line))
                .with_suggestion("Aniq muddat, miqdor yoki shartni ko'rsating"),
            );
        }
    }
    issues
}

/// `missing_info` issues for absent date, INN and amount
fn check_metadata(metadata: &ContractMetadata, contract_type: ContractType) -> Vec<ComplianceIssue> {
    let mut issues = Vec::new();

    if metadata.date.is_none() {
        issues.push(
            ComplianceIssue::new(
                IssueType::MissingInfo,
                Severity::High,
                "Shartnoma sanasi ko'rsatilmagan",
                "Shartnoma tuzilgan sana aniqlanmadi",
            )
            .with_citation(LawCitation::new(CIVIL_CODE, "107"))
            .with_suggestion("Shartnoma sanasini aniq ko'rsating"),
        );
    }

    for (role, ordinal, name) in [
        (PartyRole::First, "1", "Birinchi"),
        (PartyRole::Second, "2", "Ikkinchi"),
    ] {
        if metadata.party(role).and_then(|p| p.inn.as_ref()).is_none() {
            issues.push(
                ComplianceIssue::new(
                    IssueType::MissingInfo,
                    Severity::High,
                    format!("{}-tomon INN/STIR ko'rsatilmagan", ordinal),
                    format!("{} tomonning identifikatsiya raqami topilmadi", name),
                )
                .with_suggestion("Tomonning INN/STIR raqamini qo'shing"),
            );
        }
    }

    let needs_amount = matches!(
        contract_type,
        ContractType::Service | ContractType::Supply | ContractType::Work | ContractType::Procurement
    );
    if needs_amount && metadata.total_amount.is_none() {
        issues.push(
            ComplianceIssue::new(
                IssueType::MissingInfo,
                Severity::High,
                "Shartnoma summasi ko'rsatilmagan",
                "Shartnomaning umumiy summasi aniqlanmadi",
            )
            .with_citation(LawCitation::new(CIVIL_CODE, "356"))
            .with_suggestion("Shartnoma summasini aniq ko'rsating"),
        );
    }

    issues
}
