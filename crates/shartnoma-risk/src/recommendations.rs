//! Reviewer recommendations

use shartnoma_domain::ComplianceIssue;

/// Most recommendations returned for one contract
pub const MAX_RECOMMENDATIONS: usize = 7;

/// Issues whose suggestions are considered, most severe first
const TOP_ISSUES: usize = 5;

/// Suggestions of the most severe issues followed by one general line
///
/// Issues are ranked by severity; ties keep their input order. A title is used
/// at most once.
pub fn recommendations(issues: &[ComplianceIssue], risk_score: u8) -> Vec<String> {
    let mut ranked: Vec<&ComplianceIssue> = issues.iter().filter(|i| !i.resolved).collect();
    ranked.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut seen_titles: Vec<&str> = Vec::new();
    let mut lines = Vec::new();
    for issue in ranked.into_iter().take(TOP_ISSUES) {
        let Some(suggestion) = issue.suggestion.as_deref() else {
            continue;
        };
        if seen_titles.contains(&issue.title.as_str()) {
            continue;
        }
        seen_titles.push(&issue.title);
        lines.push(suggestion.to_string());
    }

    lines.push(general_line(risk_score).to_string());
    lines.truncate(MAX_RECOMMENDATIONS);
    lines
}

fn general_line(risk_score: u8) -> &'static str {
    match risk_score {
        0..=29 => "Shartnomani tubdan qayta ko'rib chiqish tavsiya etiladi",
        30..=49 => "Shartnomada bir nechta muhim kamchiliklar mavjud",
        50..=69 => "Shartnoma yaxshi, lekin ayrim o'zgartirishlar kiritish kerak",
        _ => "Shartnoma asosan qonun talablariga mos keladi",
    }
}
