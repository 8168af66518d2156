//! Local spelling rules
//!
//! Deterministic checks that need no dictionary service:
//!
//! - known misspellings of common legal words, per language
//! - `x` written for `h` at the start of Uzbek Latin words
//! - a backtick used as the Uzbek apostrophe, or the apostrophe left out
//! - Latin and Cyrillic letters mixed inside one word
//!
//! The first rule that fires decides the suggestion for a word.

use regex::Regex;
use shartnoma_domain::traits::SpellingSuggestion;
use shartnoma_domain::Language;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{L}[\p{L}'ʻʼ‘’`]*").expect("token regex")
});

/// Legal terms and abbreviations never reported
const WHITELIST: &[&str] = &[
    "mchj", "aj", "xk", "qk", "yatt", "inn", "mfo", "stir", "pasport", "seriya", "raqam", "direktor", "boshliq",
    "rahbar", "hisobchi", "yurist", "shartnoma", "buyurtmachi", "pudratchi", "ijrochi", "tomonlar", "bank",
    "filial", "valyuta", "summa", "to'lov", "muddat", "foiz", "jarima", "penya", "kafolat", "akt", "dalolatnoma",
    "ilova", "modda", "band", "qism", "bob", "bo'lim", "faks", "мчж", "аж", "хк", "қк", "якка", "тадбиркор", "инн",
    "мфо", "стир", "паспорт", "серия", "рақам", "директор", "раҳбар", "юрист", "шартнома", "буюртмачи", "пудратчи",
    "ижрочи", "томонлар", "банк", "филиал", "валюта", "сумма", "тўлов", "муддат", "фоиз", "жарима", "пеня",
    "кафолат", "акт", "далолатнома", "илова", "модда", "банд", "қисм", "боб", "бўлим", "ооо", "оао", "ип",
];

/// Uzbek words spelled with `h` that are often typed with `x`
const H_WORDS: &[&str] = &[
    "hozir", "hozirgi", "hech", "hechqanday", "ham", "hamda", "hamkor", "hamkorlik", "hamma", "hammasi", "har",
    "harqanday", "harakat", "hatto", "holat", "holati", "holatda", "holatlar", "hukumat", "hukumati", "huquq",
    "huquqi", "huquqiy", "huquqlar", "huquqlari", "hujjat", "hujjati", "hujjatlar", "hujjatlarni", "hisob",
    "hisobi", "hisobga", "hisoblanadi", "hisoblash", "hisobot", "hodisa", "hosil", "hurmat", "himoya", "himoyasi",
    "havola", "haqiqiy", "haq", "haqi", "haqida", "haqli", "halol", "hajm", "hajmi", "hudud", "hududi",
];

/// Words whose apostrophe is commonly dropped
const APOSTROPHE_WORDS: &[(&str, &str)] = &[
    ("ozbekiston", "o'zbekiston"),
    ("bolim", "bo'lim"),
    ("tolov", "to'lov"),
    ("tolovlar", "to'lovlar"),
    ("qoshimcha", "qo'shimcha"),
    ("malumot", "ma'lumot"),
    ("taminlash", "ta'minlash"),
    ("taminot", "ta'minot"),
    ("boyicha", "bo'yicha"),
    ("korsatish", "ko'rsatish"),
    ("korsatadi", "ko'rsatadi"),
    ("orniga", "o'rniga"),
    ("togri", "to'g'ri"),
    ("moljal", "mo'ljal"),
    ("boladi", "bo'ladi"),
    ("bolib", "bo'lib"),
    ("bolgan", "bo'lgan"),
    ("bolsa", "bo'lsa"),
    ("bolishi", "bo'lishi"),
    ("korib", "ko'rib"),
    ("yoriqnoma", "yo'riqnoma"),
    ("ozgartirish", "o'zgartirish"),
];

const UZ_CYRILLIC_CORRECTIONS: &[(&str, &str)] = &[
    ("конун", "қонун"),
    ("конуни", "қонуни"),
    ("карор", "қарор"),
    ("кисм", "қисм"),
    ("кисмида", "қисмида"),
    ("килиш", "қилиш"),
    ("килади", "қилади"),
    ("килинади", "қилинади"),
    ("кабул", "қабул"),
    ("кайд", "қайд"),
    ("карз", "қарз"),
    ("узбекистон", "ўзбекистон"),
    ("узгартириш", "ўзгартириш"),
    ("утказиш", "ўтказиш"),
    ("хамда", "ҳамда"),
    ("хисоб", "ҳисоб"),
    ("хукумат", "ҳукумат"),
    ("хуқуқ", "ҳуқуқ"),
    ("хужжат", "ҳужжат"),
    ("холат", "ҳолат"),
    ("химоя", "ҳимоя"),
    ("шахри", "шаҳри"),
    ("шахар", "шаҳар"),
    ("махкама", "маҳкама"),
    ("рахбар", "раҳбар"),
    ("мехнат", "меҳнат"),
    ("мухр", "муҳр"),
    ("мухлат", "муҳлат"),
];

const RU_CORRECTIONS: &[(&str, &str)] = &[
    ("даговор", "договор"),
    ("обязательсво", "обязательство"),
    ("ответственость", "ответственность"),
    ("выполение", "выполнение"),
    ("предоставение", "предоставление"),
    ("соглашенние", "соглашение"),
    ("обеспеченние", "обеспечение"),
    ("исполнене", "исполнение"),
    ("стоимоть", "стоимость"),
    ("качесво", "качество"),
    ("гарантя", "гарантия"),
];

/// Cyrillic letters drawn like Latin ones
const LOOKALIKES: &[(char, char)] = &[
    ('а', 'a'),
    ('е', 'e'),
    ('о', 'o'),
    ('р', 'p'),
    ('с', 'c'),
    ('у', 'y'),
    ('х', 'x'),
    ('А', 'A'),
    ('В', 'B'),
    ('Е', 'E'),
    ('К', 'K'),
    ('М', 'M'),
    ('Н', 'H'),
    ('О', 'O'),
    ('Р', 'P'),
    ('С', 'C'),
    ('Т', 'T'),
    ('Х', 'X'),
];

const SURNAME_SUFFIXES: &[&str] = &[
    "ov", "ev", "ova", "eva", "vich", "ovna", "evna", "zoda", "ов", "ев", "ова", "ева", "вич", "овна", "евна", "зода",
];

/// Lines at the top of the document where capitalized OCR noise is tolerated
const TITLE_LINES: usize = 3;

/// Rule-based checker for Uzbek and Russian text
pub struct SpellingRules {
    whitelist: HashSet<&'static str>,
    h_words: HashSet<&'static str>,
    apostrophes: HashMap<&'static str, &'static str>,
    uz_cyrillic: HashMap<&'static str, &'static str>,
    russian: HashMap<&'static str, &'static str>,
}

impl Default for SpellingRules {
    fn default() -> Self {
        Self {
            whitelist: WHITELIST.iter().copied().collect(),
            h_words: H_WORDS.iter().copied().collect(),
            apostrophes: APOSTROPHE_WORDS.iter().copied().collect(),
            uz_cyrillic: UZ_CYRILLIC_CORRECTIONS.iter().copied().collect(),
            russian: RU_CORRECTIONS.iter().copied().collect(),
        }
    }
}

impl SpellingRules {
    /// Create the rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `text`, first occurrence of each word only
    pub fn check(&self, text: &str, language: Language) -> Vec<SpellingSuggestion> {
        let title_end = text
            .match_indices('\n')
            .nth(TITLE_LINES - 1)
            .map_or(text.len(), |(i, _)| i);
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for token in TOKEN.find_iter(text) {
            let word = token.as_str();
            let lower = word.to_lowercase();
            if self.whitelist.contains(lower.as_str()) || !seen.insert(lower.clone()) {
                continue;
            }
            let in_title = token.start() < title_end;
            if let Some(suggestion) = self.suggest(word, &lower, language, in_title) {
                found.push(SpellingSuggestion {
                    offset: token.start(),
                    word: word.to_string(),
                    suggestions: vec![suggestion],
                });
            }
        }
        found
    }

    /// Whether a word is a legal term or abbreviation that is never reported
    pub fn is_whitelisted(&self, word: &str) -> bool {
        self.whitelist.contains(word.to_lowercase().as_str())
    }

    fn suggest(&self, word: &str, lower: &str, language: Language, in_title: bool) -> Option<String> {
        let table = match language {
            Language::UzCyrillic => &self.uz_cyrillic,
            Language::Ru => &self.russian,
            Language::UzLatin => &self.apostrophes,
        };
        if let Some(correct) = table.get(lower) {
            return Some(preserve_case(word, correct));
        }

        if language == Language::UzLatin {
            if let Some(rest) = lower.strip_prefix('x') {
                let candidate = format!("h{}", rest);
                if self.h_words.contains(candidate.as_str()) {
                    return Some(preserve_case(word, &candidate));
                }
            }
        }

        if has_internal_backtick(word) {
            return Some(word.replace('`', "'"));
        }

        if is_mixed_script(word) && !(in_title && is_caps(word) && word.chars().count() <= 12) {
            return Some(fix_mixed_script(word));
        }
        None
    }
}

/// Capitalized word with a common surname ending
pub fn looks_like_surname(word: &str) -> bool {
    let lower = word.to_lowercase();
    word.chars().next().is_some_and(char::is_uppercase) && SURNAME_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

/// A word holding both Latin and Cyrillic letters
pub fn is_mixed_script(word: &str) -> bool {
    word.chars().any(is_latin) && word.chars().any(is_cyrillic)
}

/// Rewrite lookalike letters into the word's majority script
pub fn fix_mixed_script(word: &str) -> String {
    let latin = word.chars().filter(|c| is_latin(*c)).count();
    let cyrillic = word.chars().filter(|c| is_cyrillic(*c)).count();
    word.chars()
        .map(|c| {
            let swap = if latin > cyrillic {
                LOOKALIKES.iter().find(|(cyr, _)| *cyr == c).map(|(_, lat)| *lat)
            } else {
                LOOKALIKES.iter().find(|(_, lat)| *lat == c).map(|(cyr, _)| *cyr)
            };
            swap.unwrap_or(c)
        })
        .collect()
}

fn has_internal_backtick(word: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();
    chars
        .windows(3)
        .any(|w| w[1] == '`' && w[0].is_alphabetic() && w[2].is_alphabetic())
}

fn is_caps(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}

fn preserve_case(original: &str, suggestion: &str) -> String {
    if is_caps(original) {
        return suggestion.to_uppercase();
    }
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = suggestion.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    suggestion.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(found: &[SpellingSuggestion]) -> Vec<(&str, &str)> {
        found
            .iter()
            .map(|s| (s.word.as_str(), s.suggestions[0].as_str()))
            .collect()
    }

    #[test]
    fn test_missing_apostrophe_and_x_for_h() {
        let rules = SpellingRules::new();
        let text = "Tolov bolim boyicha amalga oshiriladi, xujjatlar xizmat uchun.";
        let found = rules.check(text, Language::UzLatin);
        assert_eq!(
            pairs(&found),
            vec![
                ("Tolov", "To'lov"),
                ("bolim", "bo'lim"),
                ("boyicha", "bo'yicha"),
                ("xujjatlar", "hujjatlar"),
            ]
        );
        assert_eq!(found[1].offset, "Tolov ".len());
    }

    #[test]
    fn test_backtick_apostrophe() {
        let rules = SpellingRules::new();
        let found = rules.check("Ijrochi xizmat ko`rsatadi", Language::UzLatin);
        assert_eq!(pairs(&found), vec![("ko`rsatadi", "ko'rsatadi")]);
    }

    #[test]
    fn test_mixed_script_word() {
        let rules = SpellingRules::new();
        // Cyrillic "а" and "о" inside a Latin word
        let text = "1\n2\n3\nShartnomа tuzildi, Тошкент shahri, dоgovor";
        let found = rules.check(text, Language::UzLatin);
        assert_eq!(pairs(&found), vec![("Shartnomа", "Shartnoma"), ("dоgovor", "dogovor")]);
        assert!(found.iter().all(|s| !is_mixed_script(&s.suggestions[0])));
    }

    #[test]
    fn test_mixed_script_towards_cyrillic() {
        assert_eq!(fix_mixed_script("дoговор"), "договор");
        assert!(!is_mixed_script("договор"));
    }

    #[test]
    fn test_capitals_in_title_lines_are_tolerated() {
        let rules = SpellingRules::new();
        let found = rules.check("ДОГОВОР OKAЗAНИЯ УСЛУГ\nг. Ташкент", Language::Ru);
        assert!(found.is_empty());
    }

    #[test]
    fn test_russian_corrections() {
        let rules = SpellingRules::new();
        let found = rules.check("Настоящий даговор и его стоимоть", Language::Ru);
        assert_eq!(pairs(&found), vec![("даговор", "договор"), ("стоимоть", "стоимость")]);
    }

    #[test]
    fn test_uzbek_cyrillic_corrections() {
        let rules = SpellingRules::new();
        let found = rules.check("Конун ва карор асосида", Language::UzCyrillic);
        assert_eq!(pairs(&found), vec![("Конун", "Қонун"), ("карор", "қарор")]);
        // Russian tables do not apply to Uzbek text
        assert!(rules.check("даговор", Language::UzCyrillic).is_empty());
    }

    #[test]
    fn test_whitelist_and_first_occurrence() {
        let rules = SpellingRules::new();
        assert!(rules.is_whitelisted("MChJ"));
        assert!(rules.is_whitelisted("to'lov"));
        let found = rules.check("bolim va yana bolim", Language::UzLatin);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_surnames() {
        assert!(looks_like_surname("Karimov"));
        assert!(looks_like_surname("Каримова"));
        assert!(!looks_like_surname("karimov"));
        assert!(!looks_like_surname("Shartnoma"));
    }
}
