//! Uzbek summary text of an analysis

use shartnoma_domain::{AnalysisResult, IssueType, SectionLabel, Severity, Stage, WarningCode};
use shartnoma_risk::RiskLevel;
use std::collections::BTreeMap;

/// Recommendations given when the document is not a contract
pub const NOT_A_CONTRACT_RECOMMENDATIONS: [&str; 3] = [
    "To'g'ri shartnoma hujjatini yuklang",
    "Shartnoma quyidagi turlardan biri bo'lishi kerak: xizmat ko'rsatish, mol yetkazib berish, pudrat, mehnat, ijara, davlat xaridi, qarz",
    "Shartnomada tomonlar, muddat, narx va boshqa majburiy elementlar bo'lishi kerak",
];

/// Stage name shown to the reviewer
pub fn stage_title_uz(stage: Stage) -> &'static str {
    match stage {
        Stage::Extraction => "Matnni ajratib olish",
        Stage::Ocr => "Skanerlangan sahifalarni tanish (OCR)",
        Stage::LanguageDetection => "Tilni aniqlash",
        Stage::Segmentation => "Bo'limlarga ajratish",
        Stage::Compliance => "Qonunchilikka muvofiqlik tekshiruvi",
        Stage::Spelling => "Imlo tekshiruvi",
        Stage::Rag => "Sun'iy intellekt tahlili",
        Stage::Scoring => "Xavfni baholash",
        Stage::Assembly => "Natijani yig'ish",
    }
}

fn level_text(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "past (qonunga mos)",
        RiskLevel::Medium => "o'rta (takomillashtirish kerak)",
        RiskLevel::High => "yuqori (jiddiy muammolar bor)",
    }
}

/// Summary of a completed analysis of a contract
///
/// `section_notes` are the model's short assessments, one per reviewed
/// section, in source order.
pub fn contract_summary(
    result: &AnalysisResult,
    level: RiskLevel,
    section_notes: &[(SectionLabel, String)],
) -> String {
    let mut parts = vec![
        "Shartnoma tahlili yakunlandi.".to_string(),
        format!(
            "Til: {}",
            result.language.map_or("aniqlanmadi", |l| l.display_name())
        ),
        format!("Bo'limlar soni: {}", result.sections.len()),
    ];

    if result.issues.is_empty() {
        parts.push("\nMuammolar topilmadi.".to_string());
    } else {
        parts.push(format!("\nAniqlangan muammolar: {}", result.issues.len()));
        let critical = result.count_severity(Severity::Critical);
        let high = result.count_severity(Severity::High);
        if critical > 0 {
            parts.push(format!("- Jiddiy: {}", critical));
        }
        if high > 0 {
            parts.push(format!("- Yuqori: {}", high));
        }
    }

    parts.push(format!(
        "\nXavf darajasi: {}/100 - {}",
        result.risk_score,
        level_text(level)
    ));

    if !section_notes.is_empty() {
        parts.push("\nBo'limlar bo'yicha xulosa:".to_string());
        for (label, note) in section_notes {
            parts.push(format!("- {}: {}", label.title_uz(), note));
        }
    }

    parts.extend(degraded_lines(result));
    parts.join("\n")
}

/// Summary of a document that is not a contract
pub fn not_a_contract_summary(result: &AnalysisResult) -> String {
    let spelling = result
        .issues
        .iter()
        .filter(|i| i.issue_type == IssueType::Spelling)
        .count();
    let mut parts = vec![format!(
        "Yuklangan hujjat shartnoma emas yoki shartnoma formatiga to'g'ri kelmaydi. \
         Chuqur tahlil amalga oshirilmadi. Aniqlangan imloviy xatolar soni: {}",
        spelling
    )];
    parts.extend(degraded_lines(result));
    parts.join("\n")
}

/// One line per stage that lost content, in pipeline order
fn degraded_lines(result: &AnalysisResult) -> Vec<String> {
    let mut by_stage: BTreeMap<Stage, BTreeMap<&'static str, usize>> = BTreeMap::new();
    for warning in result.warnings.iter().filter(|w| w.code.is_degrading()) {
        // Not being a contract is reported by the summary itself
        if warning.code == WarningCode::NotAContract {
            continue;
        }
        *by_stage
            .entry(warning.stage)
            .or_default()
            .entry(warning.code.as_str())
            .or_insert(0) += 1;
    }
    if by_stage.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![
        "\nDiqqat: quyidagi bosqichlar to'liq bajarilmadi, xavf bahosi kamroq ishonchli:".to_string(),
    ];
    for (stage, codes) in by_stage {
        let codes: Vec<String> = codes
            .into_iter()
            .map(|(code, count)| {
                if count > 1 {
                    format!("{} ({})", code, count)
                } else {
                    code.to_string()
                }
            })
            .collect();
        lines.push(format!("- {}: {}", stage_title_uz(stage), codes.join(", ")));
    }
    lines
}
