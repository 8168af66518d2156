//! Contract type detection and the "is this a contract at all" check

use crate::metadata::{FIRST_PARTY_WORDS, SECOND_PARTY_WORDS};
use crate::text::fold_apostrophes;
use shartnoma_domain::ContractType;
use tracing::debug;

const TYPE_KEYWORDS: &[(ContractType, &[&str])] = &[
    (
        ContractType::Service,
        &["xizmat ko'rsatish", "оказание услуг", "xizmatlar", "услуги", "сервис", "хизмат кўрсатиш"],
    ),
    (
        ContractType::Supply,
        &["mol yetkazib berish", "поставка", "yetkazib berish", "mahsulot yetkazish", "товар", "етказиб бериш"],
    ),
    (
        ContractType::Work,
        &["pudrat", "подряд", "qurilish", "ta'mirlash", "строительство", "ремонт"],
    ),
    (
        ContractType::Labor,
        &["mehnat shartnomasi", "трудовой договор", "ish haqi", "заработная плата", "xodim", "меҳнат шартномаси"],
    ),
    (ContractType::Lease, &["ijara", "аренд", "ijaraga berish", "ijaraga olish", "ижара"]),
    (
        ContractType::Procurement,
        &["davlat xaridi", "государственная закупка", "tender", "тендер", "konkurs"],
    ),
    (ContractType::Loan, &["qarz", "займ", "кредит", "kredit", "ssuda"]),
];

const CONTRACT_WORDS: &[&str] = &[
    "shartnoma", "договор", "kelishuv", "соглашение", "bitim", "контракт", "kontrakt", "шартнома",
];

const GENERIC_PARTY_WORDS: &[&str] = &["tomon", "сторона", "томон"];

const LEGAL_WORDS: &[&str] = &[
    "muddat", "срок", "narx", "цена", "summa", "сумма", "majburiyat", "обязательство", "huquq",
    "право", "javobgarlik", "ответственность", "imzo", "подпись",
];

fn normalize(text: &str) -> String {
    fold_apostrophes(&text.to_lowercase())
}

/// Contract type with the most keyword hits; `Other` when nothing matches
///
/// Equal counts keep the first type in declaration order.
pub fn detect_contract_type(text: &str) -> ContractType {
    let lower = normalize(text);
    let mut best = (ContractType::Other, 0usize);

    for (contract_type, keywords) in TYPE_KEYWORDS {
        let hits = keywords.iter().filter(|k| lower.contains(*k)).count();
        if hits > best.1 {
            best = (*contract_type, hits);
        }
    }

    debug!("Contract type {} ({} keyword hits)", best.0.as_str(), best.1);
    best.0
}

/// Declared type when it says something, detected type otherwise
pub fn resolve_contract_type(declared: Option<ContractType>, text: &str) -> ContractType {
    match declared {
        Some(declared) if declared != ContractType::Other => declared,
        _ => detect_contract_type(text),
    }
}

/// Whether the text reads as a contract
///
/// A recognized type is enough. Otherwise the text needs a contract word plus
/// either a party word or at least two legal terms.
pub fn is_contract(text: &str, contract_type: ContractType) -> bool {
    if contract_type != ContractType::Other {
        return true;
    }
    let lower = normalize(text);

    let has_contract_word = CONTRACT_WORDS.iter().any(|w| lower.contains(w));
    let has_party = FIRST_PARTY_WORDS
        .iter()
        .chain(SECOND_PARTY_WORDS.iter())
        .chain(GENERIC_PARTY_WORDS.iter())
        .any(|w| lower.contains(w));
    let legal_terms = LEGAL_WORDS.iter().filter(|w| lower.contains(*w)).count();

    has_contract_word && (has_party || legal_terms >= 2)
}
