//! Pattern tables and numeric helpers used by the engine

use crate::error::ComplianceError;
use regex::Regex;
use shartnoma_domain::Severity;
use shartnoma_parser::metadata::parse_amount;
use shartnoma_parser::text::fold_apostrophes;
use std::sync::LazyLock;

/// Longest excerpt attached to an issue, in characters
const EXCERPT_CHARS: usize = 200;

static PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)*)\s*(?:%|foiz|фоиз|процент)").expect("percent regex")
});

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d[\d \u{00A0}]*(?:[.,]\d+)*)\s*(?:so'm|som\b|сўм|сум|uzs|usd|eur|\$|€)")
        .expect("penalty amount regex")
});

/// Clauses that give one party a right the other lacks: (pattern, issue title)
pub const ONE_SIDED_PATTERNS: &[(&str, &str)] = &[
    ("bir tomonlama bekor", "Bir tomonlama bekor qilish huquqi"),
    ("bir tomonlama o'zgartir", "Bir tomonlama o'zgartirish huquqi"),
    ("бир томонлама бекор", "Bir tomonlama bekor qilish huquqi"),
    ("односторонн", "Bir tomonlama rad etish"),
    ("без согласия", "Rozilikisiz o'zgartirish"),
    ("roziligisiz", "Rozilikisiz o'zgartirish"),
    ("ogohlantirmasdan", "Ogohlantirishsiz harakat"),
    ("без предупреждения", "Ogohlantirishsiz harakat"),
    ("faqat buyurtmachi", "Faqat bir tomonga berilgan huquq"),
    ("faqat ijrochi", "Faqat bir tomonga berilgan huquq"),
    ("только заказчик", "Faqat bir tomonga berilgan huquq"),
    ("только исполнитель", "Faqat bir tomonga berilgan huquq"),
];

/// Wording too vague to enforce
pub const VAGUE_TERMS: &[&str] = &[
    "imkon qadar",
    "zarur hollarda",
    "zarur bo'lganda",
    "va hokazo",
    "va boshqalar",
    "tegishli tartibda",
    "oqilona muddat",
    "имкон қадар",
    "зарур ҳолларда",
    "ва ҳоказо",
    "по возможности",
    "при необходимости",
    "в разумный срок",
    "и т.д.",
    "и т.п.",
    "в установленном порядке",
];

/// Lowercase with apostrophes folded, for keyword matching
pub fn normalize(text: &str) -> String {
    fold_apostrophes(&text.to_lowercase())
}

/// Trimmed line, cut to a readable length
pub fn excerpt(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
        format!("{}…", cut)
    }
}

/// Read a percentage token ("60", "0,5", "2.5")
pub fn parse_percent(raw: &str) -> Result<f64, ComplianceError> {
    let separators = raw.matches([',', '.']).count();
    if separators > 1 {
        return Err(ComplianceError::MalformedNumber(raw.to_string()));
    }
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ComplianceError::MalformedNumber(raw.to_string()))
}

/// Penalty rates stated on one line, in percent of the contract value
///
/// Percent tokens are taken as written. A line without any falls back to its
/// money amounts, as their share of the contract value when that is known.
pub fn penalty_rates(line: &str, total_amount: Option<f64>) -> Result<Vec<f64>, ComplianceError> {
    let lower = normalize(line);
    let mut rates = Vec::new();

    for captures in PERCENT.captures_iter(&lower) {
        if let Some(m) = captures.get(1) {
            rates.push(parse_percent(m.as_str())?);
        }
    }

    if !rates.is_empty() {
        return Ok(rates);
    }
    if let Some(total) = total_amount.filter(|t| *t > 0.0) {
        for captures in AMOUNT.captures_iter(&lower) {
            if let Some(m) = captures.get(1) {
                let amount = parse_amount(m.as_str())
                    .ok_or_else(|| ComplianceError::MalformedNumber(m.as_str().trim().to_string()))?;
                rates.push(amount / total * 100.0);
            }
        }
    }

    Ok(rates)
}

/// Severity of a penalty over the cap, growing with the excess
///
/// Up to 10% over the cap is `medium`, up to double the cap `high`, beyond that
/// `critical`.
pub fn penalty_severity(rate: f64, cap: f64) -> Option<Severity> {
    if rate <= cap {
        return None;
    }
    let excess = (rate - cap) / cap;
    Some(if excess < 0.1 {
        Severity::Medium
    } else if excess < 1.0 {
        Severity::High
    } else {
        Severity::Critical
    })
}

/// Format a rate without trailing zeros
pub fn format_rate(rate: f64) -> String {
    let rounded = (rate * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("60"), Ok(60.0));
        assert_eq!(parse_percent("0,5"), Ok(0.5));
        assert_eq!(parse_percent("2.5"), Ok(2.5));
        assert!(matches!(
            parse_percent("1.2.3"),
            Err(ComplianceError::MalformedNumber(_))
        ));
    }

    #[test]
    fn test_penalty_rates_from_percent_and_amount() {
        let rates = penalty_rates("Penya shartnoma summasining 60% miqdorida", None).unwrap();
        assert_eq!(rates, vec![60.0]);

        let rates = penalty_rates("Jarima 6 000 000 so'm", Some(10_000_000.0)).unwrap();
        assert_eq!(rates, vec![60.0]);

        // Amounts mean nothing without the contract value
        assert!(penalty_rates("Jarima 6 000 000 so'm", None).unwrap().is_empty());

        // A stated rate wins over the contract price quoted on the same line
        let rates = penalty_rates("Narx 10 000 000 so'm, penya 60%", Some(10_000_000.0)).unwrap();
        assert_eq!(rates, vec![60.0]);

        let rates = penalty_rates("Пеня 0,1 процента за каждый день, но не более 10%", None).unwrap();
        assert_eq!(rates, vec![0.1, 10.0]);
    }

    #[test]
    fn test_malformed_percent_is_an_error() {
        assert!(penalty_rates("penya 1.2.3%", None).is_err());
    }

    #[test]
    fn test_penalty_severity_grows_with_excess() {
        assert_eq!(penalty_severity(50.0, 50.0), None);
        assert_eq!(penalty_severity(52.0, 50.0), Some(Severity::Medium));
        assert_eq!(penalty_severity(60.0, 50.0), Some(Severity::High));
        assert_eq!(penalty_severity(100.0, 50.0), Some(Severity::Critical));
    }

    #[test]
    fn test_excerpt_and_format() {
        assert_eq!(excerpt("  qisqa  "), "qisqa");
        assert_eq!(excerpt(&"a".repeat(250)).chars().count(), EXCERPT_CHARS + 1);
        assert_eq!(format_rate(60.0), "60");
        assert_eq!(format_rate(0.5), "0.5");
    }
}
