//! Contract metadata: number, date, parties, INN, amount and currency

use regex::Regex;
use shartnoma_domain::{ContractMetadata, Currency, Language, Party, PartyRole};
use std::sync::LazyLock;
use tracing::debug;

/// Role words for the first party (customer, seller, lessor, employer, lender)
pub const FIRST_PARTY_WORDS: &[&str] = &[
    "buyurtmachi",
    "zakazchik",
    "заказчик",
    "буюртмачи",
    "sotuvchi",
    "продавец",
    "сотувчи",
    "ijaraga beruvchi",
    "ijara beruvchi",
    "арендодатель",
    "ish beruvchi",
    "работодатель",
    "qarz beruvchi",
    "займодавец",
    "1-tomon",
    "birinchi tomon",
];

/// Role words for the second party (contractor, buyer, lessee, employee, borrower)
pub const SECOND_PARTY_WORDS: &[&str] = &[
    "ijrochi",
    "исполнитель",
    "ижрочи",
    "pudratchi",
    "подрядчик",
    "podryadchik",
    "xaridor",
    "покупатель",
    "харидор",
    "ijaraga oluvchi",
    "ijara oluvchi",
    "арендатор",
    "xodim",
    "работник",
    "qarz oluvchi",
    "заемщик",
    "2-tomon",
    "ikkinchi tomon",
];

const UZ_MONTHS: [&str; 12] = [
    "yanvar", "fevral", "mart", "aprel", "may", "iyun", "iyul", "avgust", "sentabr", "oktabr",
    "noyabr", "dekabr",
];

const UZ_CYRILLIC_MONTHS: [&str; 12] = [
    "январ", "феврал", "март", "апрел", "май", "июн", "июл", "август", "сентябр", "октябр",
    "ноябр", "декабр",
];

const RU_MONTHS: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня", "июля", "августа", "сентября",
    "октября", "ноября", "декабря",
];

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:№|\bNo?\.)\s*(\w[\w\-/]*)").expect("number regex")
});

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[.\-/](\d{1,2})[.\-/](\d{4}|\d{2})\b").expect("numeric date regex")
});

static WORD_DATE: LazyLock<Regex> = LazyLock::new(|| {
    let months = month_alternation();
    Regex::new(&format!(r"(?i)\b(\d{{1,2}})[»\x22”]?[\s\-]+({})\w*\s+(\d{{4}})", months))
        .expect("word date regex")
});

static YEAR_FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| {
    let months = month_alternation();
    Regex::new(&format!(
        r"(?i)\b(\d{{4}})\s*(?:yil|йил|года|г\.)?\s*[\x22«“]?(\d{{1,2}})[\x22»”]?[\s\-]+({})\w*",
        months
    ))
    .expect("year-first date regex")
});

static INN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bINN|ИНН|\bSTIR|СТИР)[\s:№]*(\d{9})\b").expect("inn regex")
});

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d[\d \u{00A0}]*(?:[.,]\d+)*)\s*(so['‘’ʻ`]?m|сўм|сум|uzs|usd|eur|\$|€|долл)",
    )
    .expect("amount regex")
});

static TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:jami|итого|жами)\s*[:=]?\s*(\d[\d \u{00A0}]*(?:[.,]\d+)*)").expect("total regex")
});

static PARTY_BY_LABEL: LazyLock<[Regex; 2]> =
    LazyLock::new(|| [party_label_regex(FIRST_PARTY_WORDS), party_label_regex(SECOND_PARTY_WORDS)]);

static PARTY_BY_ALIAS: LazyLock<[Regex; 2]> =
    LazyLock::new(|| [party_alias_regex(FIRST_PARTY_WORDS), party_alias_regex(SECOND_PARTY_WORDS)]);

fn month_alternation() -> String {
    UZ_MONTHS
        .iter()
        .chain(UZ_CYRILLIC_MONTHS.iter())
        .chain(RU_MONTHS.iter())
        .map(|m| regex::escape(m))
        .collect::<Vec<_>>()
        .join("|")
}

fn alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

/// `Buyurtmachi: "Alfa" MChJ` on its own line
fn party_label_regex(words: &[&str]) -> Regex {
    Regex::new(&format!(r"(?im)^\s*(?:{})\s*[:–—\-]\s*(\S[^\n]*)$", alternation(words)))
        .expect("party label regex")
}

/// `"Alfa" MChJ (bundan buyon "Buyurtmachi" deb ataladi)`
fn party_alias_regex(words: &[&str]) -> Regex {
    Regex::new(&format!(
        r#"(?i)([«"“][^»"”\n]{{2,80}}[»"”](?:\s*[A-Za-zА-Яа-яЎўҚқҒғҲҳ]{{2,5}}\b)?)[^«"“\n]{{0,120}}?[«"“]?(?:{})"#,
        alternation(words)
    ))
    .expect("party alias regex")
}

/// Month number (1-based) of a month word in any of the three languages
fn month_number(word: &str) -> Option<u32> {
    let lower = word.to_lowercase();
    [&UZ_MONTHS, &UZ_CYRILLIC_MONTHS, &RU_MONTHS]
        .iter()
        .find_map(|months| months.iter().position(|m| lower.starts_with(m)))
        .map(|idx| idx as u32 + 1)
}

fn format_date(day: u32, month: u32, year: u32) -> Option<String> {
    let year = if year < 100 { 2000 + year } else { year };
    if (1..=31).contains(&day) && (1..=12).contains(&month) && (1900..=2100).contains(&year) {
        Some(format!("{:02}.{:02}.{}", day, month, year))
    } else {
        None
    }
}

/// Earliest plausible date in the text, as `dd.mm.yyyy`
pub fn find_date(text: &str) -> Option<String> {
    let mut candidates: Vec<(usize, String)> = Vec::new();

    if let Some(found) = NUMERIC_DATE.captures_iter(text).find_map(|c| {
        let day = c.get(1)?.as_str().parse().ok()?;
        let month = c.get(2)?.as_str().parse().ok()?;
        let year = c.get(3)?.as_str().parse().ok()?;
        Some((c.get(0)?.start(), format_date(day, month, year)?))
    }) {
        candidates.push(found);
    }

    if let Some(found) = WORD_DATE.captures_iter(text).find_map(|c| {
        let day = c.get(1)?.as_str().parse().ok()?;
        let month = month_number(c.get(2)?.as_str())?;
        let year = c.get(3)?.as_str().parse().ok()?;
        Some((c.get(0)?.start(), format_date(day, month, year)?))
    }) {
        candidates.push(found);
    }

    if let Some(found) = YEAR_FIRST_DATE.captures_iter(text).find_map(|c| {
        let year = c.get(1)?.as_str().parse().ok()?;
        let day = c.get(2)?.as_str().parse().ok()?;
        let month = month_number(c.get(3)?.as_str())?;
        Some((c.get(0)?.start(), format_date(day, month, year)?))
    }) {
        candidates.push(found);
    }

    candidates.into_iter().min_by_key(|(pos, _)| *pos).map(|(_, date)| date)
}

/// Parse "12 000 000,50" or "1,500,000.00" as a number
pub fn parse_amount(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let commas = compact.matches(',').count();
    let dots = compact.matches('.').count();

    let normalized = if commas > 0 && dots > 0 {
        compact.replace(',', "")
    } else if commas > 1 {
        compact.replace(',', "")
    } else if dots > 1 {
        compact.replace('.', "")
    } else {
        compact.replace(',', ".")
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn currency_of_unit(unit: &str) -> Option<Currency> {
    let unit = unit.to_lowercase();
    if unit == "usd" || unit == "$" || unit.starts_with("долл") {
        Some(Currency::Usd)
    } else if unit == "eur" || unit == "€" {
        Some(Currency::Eur)
    } else if unit.is_empty() {
        None
    } else {
        Some(Currency::Uzs)
    }
}

fn currency_in_text(text: &str) -> Option<Currency> {
    let upper = text.to_uppercase();
    if upper.contains("USD") || text.contains('$') {
        Some(Currency::Usd)
    } else if upper.contains("EUR") || text.contains('€') {
        Some(Currency::Eur)
    } else if upper.contains("UZS") || upper.contains("СУМ") || upper.contains("СЎМ") || upper.contains("SO'M") {
        Some(Currency::Uzs)
    } else {
        None
    }
}

fn clean_party_name(raw: &str) -> Option<String> {
    let name = raw
        .trim()
        .trim_end_matches([',', ';', '.', ':'])
        .trim()
        .chars()
        .take(200)
        .collect::<String>();
    if name.chars().filter(|c| c.is_alphabetic()).count() >= 2 {
        Some(name)
    } else {
        None
    }
}

fn find_party_name(text: &str, index: usize) -> Option<String> {
    PARTY_BY_LABEL[index]
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| clean_party_name(m.as_str()))
        .or_else(|| {
            PARTY_BY_ALIAS[index]
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| clean_party_name(m.as_str()))
        })
}

/// Extract contract metadata from the full text
pub fn extract_metadata(text: &str, language: Language) -> ContractMetadata {
    let number = NUMBER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches(['-', '/']).to_string())
        .find(|n| n.chars().any(|c| c.is_ascii_digit()));

    let date = find_date(text);

    let inns: Vec<String> = INN
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();

    let (total_amount, unit) = match AMOUNT
        .captures_iter(text)
        .find_map(|c| Some((parse_amount(c.get(1)?.as_str())?, c.get(2)?.as_str().to_string())))
    {
        Some((amount, unit)) => (Some(amount), unit),
        None => (
            TOTAL
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| parse_amount(m.as_str())),
            String::new(),
        ),
    };
    let currency = currency_of_unit(&unit).or_else(|| currency_in_text(text));

    let mut parties = Vec::new();
    for (index, role) in [PartyRole::First, PartyRole::Second].into_iter().enumerate() {
        let party = Party {
            role,
            name: find_party_name(text, index),
            inn: inns.get(index).cloned(),
        };
        if party.is_identified() {
            parties.push(party);
        }
    }

    debug!(
        "Metadata: number={:?} date={:?} parties={} amount={:?}",
        number,
        date,
        parties.len(),
        total_amount
    );

    ContractMetadata {
        number,
        date,
        parties,
        total_amount,
        currency,
        language: Some(language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UZ_TEXT: &str = "XIZMAT KO'RSATISH SHARTNOMASI № 15/2024
Toshkent sh.                     12.03.2024

\"Alfa\" MChJ (bundan buyon \"Buyurtmachi\" deb ataladi) bir tomondan va \"Beta Servis\" MChJ (bundan buyon \"Ijrochi\") ikkinchi tomondan.

2.1. Shartnoma narxi 12 000 000,00 so'm.

Buyurtmachi STIR: 301234567
Ijrochi STIR: 302345678
";

    #[test]
    fn test_extracts_uzbek_metadata() {
        let metadata = extract_metadata(UZ_TEXT, Language::UzLatin);
        assert_eq!(metadata.number.as_deref(), Some("15/2024"));
        assert_eq!(metadata.date.as_deref(), Some("12.03.2024"));
        assert_eq!(metadata.total_amount, Some(12_000_000.0));
        assert_eq!(metadata.currency, Some(Currency::Uzs));
        assert_eq!(metadata.language, Some(Language::UzLatin));

        let first = metadata.party(PartyRole::First).unwrap();
        assert_eq!(first.name.as_deref(), Some("\"Alfa\" MChJ"));
        assert_eq!(first.inn.as_deref(), Some("301234567"));
        let second = metadata.party(PartyRole::Second).unwrap();
        assert_eq!(second.name.as_deref(), Some("\"Beta Servis\" MChJ"));
        assert_eq!(second.inn.as_deref(), Some("302345678"));
    }

    #[test]
    fn test_party_by_label_line() {
        let text = "Заказчик: ООО «Восток»\nИсполнитель: ИП Каримов А.\n";
        let metadata = extract_metadata(text, Language::Ru);
        assert_eq!(
            metadata.party(PartyRole::First).and_then(|p| p.name.clone()).as_deref(),
            Some("ООО «Восток»")
        );
        assert_eq!(
            metadata.party(PartyRole::Second).and_then(|p| p.name.clone()).as_deref(),
            Some("ИП Каримов А")
        );
    }

    #[test]
    fn test_word_dates() {
        assert_eq!(find_date("«15» марта 2024 года").as_deref(), Some("15.03.2024"));
        assert_eq!(find_date("15 марта 2024 года").as_deref(), Some("15.03.2024"));
        assert_eq!(find_date("2024 yil 5 aprel").as_deref(), Some("05.04.2024"));
        assert_eq!(find_date("sana: 31.13.2024").as_deref(), None);
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(parse_amount("12 000 000,50"), Some(12_000_000.5));
        assert_eq!(parse_amount("1,500,000.00"), Some(1_500_000.0));
        assert_eq!(parse_amount("1.500.000"), Some(1_500_000.0));
        assert_eq!(parse_amount("250"), Some(250.0));
    }

    #[test]
    fn test_usd_amount() {
        let metadata = extract_metadata("Umumiy qiymati 5 000 USD tashkil etadi", Language::UzLatin);
        assert_eq!(metadata.total_amount, Some(5000.0));
        assert_eq!(metadata.currency, Some(Currency::Usd));
    }

    #[test]
    fn test_empty_text() {
        let metadata = extract_metadata("", Language::Ru);
        assert!(metadata.number.is_none());
        assert!(metadata.parties.is_empty());
        assert!(metadata.currency.is_none());
    }
}
