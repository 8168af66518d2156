//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use shartnoma_domain::{AnalysisResult, AnalysisStatus, Section, Severity};
use shartnoma_parser::ParsedContract;
use shartnoma_risk::RiskLevel;
use shartnoma_store::ImportReport;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest excerpt shown in a table cell, in characters
const CELL_CHARS: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a finished analysis.
    pub fn format_analysis(&self, result: &AnalysisResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Table => Ok(self.format_analysis_table(result)),
            OutputFormat::Quiet => Ok(format!("{} {}", result.status.as_str(), result.risk_score)),
        }
    }

    fn format_analysis_table(&self, result: &AnalysisResult) -> String {
        if result.status == AnalysisStatus::Failed {
            return self.error(&format!(
                "Tahlil muvaffaqiyatsiz: {}",
                result.error.as_deref().unwrap_or("noma'lum xato")
            ));
        }

        let mut out = Vec::new();
        let level = RiskLevel::from_score(result.risk_score);
        let headline = format!("Xavf bahosi: {}/100 ({})", result.risk_score, level.label_uz());
        out.push(match level {
            RiskLevel::High => self.colorize(&headline, "red"),
            RiskLevel::Medium => self.colorize(&headline, "yellow"),
            RiskLevel::Low => self.colorize(&headline, "green"),
        });
        out.push(format!(
            "Muvofiqlik: {}  To'liqlik: {}  Aniqlik: {}  Muvozanat: {}",
            result.scores.compliance, result.scores.completeness, result.scores.clarity, result.scores.balance
        ));
        out.push(String::new());

        if result.issues.is_empty() {
            out.push(self.success("Muammolar topilmadi"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["#", "Daraja", "Turi", "Muammo", "Bo'lim", "Modda"]);
            for (i, issue) in result.issues.iter().enumerate() {
                let section = issue
                    .section
                    .map(|s| s.label.title_uz().to_string())
                    .unwrap_or_default();
                let article = issue
                    .citation
                    .as_ref()
                    .map(|c| format!("{}, {}-modda", c.law_name, c.article))
                    .unwrap_or_default();
                builder.push_record([
                    (i + 1).to_string(),
                    self.severity(issue.severity),
                    issue.issue_type.as_str().to_string(),
                    truncate(&issue.title, CELL_CHARS),
                    section,
                    article,
                ]);
            }
            out.push(self.table(builder));
        }

        if !result.recommendations.is_empty() {
            out.push(String::new());
            out.push("Tavsiyalar:".to_string());
            for recommendation in &result.recommendations {
                out.push(format!("  - {}", recommendation));
            }
        }

        for warning in &result.warnings {
            out.push(self.warning(&format!("[{}] {}: {}", warning.stage, warning.code.as_str(), warning.message)));
        }

        out.push(String::new());
        out.push(result.summary.clone());
        out.join("\n")
    }

    /// Format language and type detection.
    pub fn format_detection(&self, parsed: &ParsedContract) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "language": parsed.language.language,
                "confidence": parsed.language.confidence,
                "contract_type": parsed.contract_type,
                "is_contract": parsed.is_contract,
                "metadata": parsed.metadata,
            }))?),
            OutputFormat::Quiet => Ok(parsed.language.language.as_str().to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Til", "Ishonch", "Shartnoma turi", "Shartnoma"]);
                builder.push_record([
                    parsed.language.language.display_name().to_string(),
                    format!("{:.2}", parsed.language.confidence),
                    parsed.contract_type.as_str().to_string(),
                    if parsed.is_contract { "ha" } else { "yo'q" }.to_string(),
                ]);
                Ok(self.table(builder))
            }
        }
    }

    /// Format the sections of a text.
    pub fn format_sections(&self, text: &str, sections: &[Section]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(sections)?),
            OutputFormat::Quiet => Ok(sections
                .iter()
                .map(|s| s.label.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if sections.is_empty() {
                    return Ok(self.colorize("Bo'limlar topilmadi.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["#", "Bo'lim", "Sarlavha", "Baytlar", "Ishonch", "Bandlar"]);
                for (i, section) in sections.iter().enumerate() {
                    let heading = section
                        .heading
                        .clone()
                        .unwrap_or_else(|| first_line(section.text(text)));
                    builder.push_record([
                        i.to_string(),
                        section.label.title_uz().to_string(),
                        truncate(&heading, CELL_CHARS),
                        format!("{}..{}", section.start, section.end),
                        format!("{:.2}", section.confidence),
                        section.clauses.len().to_string(),
                    ]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format a law import report.
    pub fn import_report(&self, report: &ImportReport) -> String {
        let message = self.success(&format!(
            "Imported {} article(s) from {} law(s)",
            report.imported, report.laws
        ));
        if report.skipped > 0 {
            format!(
                "{}\n{}",
                message,
                self.warning(&format!("Skipped {} incomplete article(s)", report.skipped))
            )
        } else {
            message
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn severity(&self, severity: Severity) -> String {
        let name = severity.as_str();
        match severity {
            Severity::Critical | Severity::High => self.colorize(name, "red"),
            Severity::Medium => self.colorize(name, "yellow"),
            Severity::Low | Severity::Info => name.to_string(),
        }
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Cut `text` to `max` characters, marking the cut
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shartnoma_domain::{ComplianceIssue, DocumentId, IssueType, SectionLabel};
    use shartnoma_parser::ContractParser;

    fn finished() -> AnalysisResult {
        let mut result = AnalysisResult::started(DocumentId::new());
        result.risk_score = 40;
        result.issues = vec![ComplianceIssue::new(
            IssueType::MissingMandatorySection,
            Severity::High,
            "Majburiy bo'lim yo'q: Javobgarlik",
            "Shartnomada javobgarlik bo'limi yo'q",
        )
        .in_section(2, SectionLabel::Price)];
        result.recommendations = vec!["Javobgarlik bo'limini qo'shing".to_string()];
        result.summary = "Shartnoma tahlili yakunlandi.".to_string();
        result.complete().unwrap();
        result
    }

    #[test]
    fn test_analysis_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_analysis(&finished()).unwrap();
        assert!(output.contains("Xavf bahosi: 40/100"));
        assert!(output.contains("missing_mandatory_section"));
        assert!(output.contains("Narx va to'lov tartibi"));
        assert!(output.contains("Javobgarlik bo'limini qo'shing"));
        assert!(output.ends_with("Shartnoma tahlili yakunlandi."));
    }

    #[test]
    fn test_analysis_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_analysis(&finished()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["risk_score"], 40);
        assert_eq!(value["status"], "completed");
    }

    #[test]
    fn test_quiet_and_failed() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(formatter.format_analysis(&finished()).unwrap(), "completed 40");

        let mut failed = AnalysisResult::started(DocumentId::new());
        failed.fail("extraction failed (corrupt_document): bad zip").unwrap();
        let output = Formatter::new(OutputFormat::Table, false)
            .format_analysis(&failed)
            .unwrap();
        assert!(output.starts_with("✗ Tahlil muvaffaqiyatsiz"));
        assert!(output.contains("corrupt_document"));
    }

    #[test]
    fn test_sections_table() {
        let text = "SHARTNOMA\n1. SHARTNOMA PREDMETI\nIjrochi xizmat ko'rsatadi.\n";
        let parsed = ContractParser::default().parse(text, None, None);
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_sections(text, &parsed.sections).unwrap();
        assert!(!parsed.sections.is_empty());
        assert!(output.contains(parsed.sections[0].label.title_uz()));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("qisqa", 10), "qisqa");
        assert_eq!(truncate("juda uzun matn", 5), "juda…");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
