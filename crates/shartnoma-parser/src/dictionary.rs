//! Heading phrases and stop-words per language
//!
//! Phrases are matched word by word against a heading's content words (see
//! [`crate::text::word_matches`]); words shorter than three characters are
//! ignored on both sides, so `narx va to'lov` is stored as `narx to'lov`.

use crate::text::{content_words, word_matches};
use shartnoma_domain::{Language, SectionLabel};

type PhraseTable = &'static [(SectionLabel, &'static [&'static str])];

const UZ_LATIN_HEADINGS: PhraseTable = &[
    (SectionLabel::Subject, &["shartnoma predmeti", "shartnoma mavzusi", "predmet", "mavzu"]),
    (SectionLabel::Parties, &["tomonlar", "taraflar"]),
    (SectionLabel::Rights, &["tomonlarning huquqlari", "huquqlar"]),
    (
        SectionLabel::Obligations,
        &[
            "tomonlarning majburiyatlari",
            "majburiyatlar",
            "huquq majburiyatlar",
            "tomonlarning huquq majburiyatlari",
        ],
    ),
    (
        SectionLabel::Price,
        &["shartnoma narxi", "narx", "narx to'lov", "to'lov tartibi", "hisob kitob tartibi"],
    ),
    (SectionLabel::Delivery, &["yetkazib berish", "topshirish tartibi", "qabul qilish tartibi"]),
    (SectionLabel::Quality, &["sifat talablari", "sifat"]),
    (SectionLabel::Warranty, &["kafolat", "kafolat muddati", "kafolat majburiyatlari"]),
    (
        SectionLabel::Liability,
        &["javobgarlik", "tomonlarning javobgarligi", "moddiy javobgarlik"],
    ),
    (
        SectionLabel::ForceMajeure,
        &["fors major", "favqulodda holatlar", "yengib bo'lmaydigan kuch"],
    ),
    (SectionLabel::Disputes, &["nizolarni hal qilish", "nizolar", "kelishmovchiliklar"]),
    (
        SectionLabel::Term,
        &[
            "shartnoma muddati",
            "amal qilish muddati",
            "shartnomaning amal qilish muddati",
            "muddat",
        ],
    ),
    (
        SectionLabel::Termination,
        &["shartnomani bekor qilish", "bekor qilish", "shartnomani o'zgartirish bekor qilish"],
    ),
    (SectionLabel::Confidentiality, &["maxfiylik", "konfidensiallik"]),
    (
        SectionLabel::Requisites,
        &["tomonlarning rekvizitlari", "rekvizitlar", "yuridik manzillar", "bank rekvizitlari"],
    ),
    (SectionLabel::Signatures, &["imzolar", "tomonlarning imzolari"]),
    (
        SectionLabel::Other,
        &["qo'shimcha shartlar", "boshqa shartlar", "yakuniy qoidalar", "umumiy qoidalar"],
    ),
];

const UZ_CYRILLIC_HEADINGS: PhraseTable = &[
    (SectionLabel::Subject, &["шартнома предмети", "предмет"]),
    (SectionLabel::Parties, &["томонлар"]),
    (SectionLabel::Rights, &["томонларнинг ҳуқуқлари", "ҳуқуқлар"]),
    (
        SectionLabel::Obligations,
        &["томонларнинг мажбуриятлари", "мажбуриятлар", "ҳуқуқ мажбуриятлар"],
    ),
    (SectionLabel::Price, &["шартнома нархи", "нарх", "нарх тўлов", "тўлов тартиби", "ҳисоб китоб"]),
    (SectionLabel::Delivery, &["етказиб бериш", "топшириш тартиби"]),
    (SectionLabel::Quality, &["сифат талаблари", "сифат"]),
    (SectionLabel::Warranty, &["кафолат", "кафолат муддати"]),
    (SectionLabel::Liability, &["жавобгарлик", "томонларнинг жавобгарлиги"]),
    (SectionLabel::ForceMajeure, &["форс мажор", "фавқулодда ҳолатлар"]),
    (SectionLabel::Disputes, &["низоларни ҳал қилиш", "низолар"]),
    (
        SectionLabel::Term,
        &["шартнома муддати", "амал қилиш муддати", "шартноманинг амал қилиш муддати", "муддат"],
    ),
    (SectionLabel::Termination, &["шартномани бекор қилиш", "бекор қилиш"]),
    (SectionLabel::Confidentiality, &["махфийлик"]),
    (
        SectionLabel::Requisites,
        &["томонларнинг реквизитлари", "реквизитлар", "юридик манзиллар"],
    ),
    (SectionLabel::Signatures, &["имзолар"]),
    (SectionLabel::Other, &["қўшимча шартлар", "якуний қоидалар"]),
];

const RU_HEADINGS: PhraseTable = &[
    (SectionLabel::Subject, &["предмет договора", "предмет"]),
    (SectionLabel::Parties, &["стороны", "стороны договора"]),
    (SectionLabel::Rights, &["права сторон"]),
    (
        SectionLabel::Obligations,
        &["обязанности сторон", "обязательства сторон", "права обязанности сторон"],
    ),
    (
        SectionLabel::Price,
        &["цена договора", "стоимость", "цена", "порядок расчетов", "порядок оплаты", "условия оплаты"],
    ),
    (SectionLabel::Delivery, &["поставка", "доставка", "порядок сдачи", "порядок приемки"]),
    (SectionLabel::Quality, &["качество", "требования качеству"]),
    (SectionLabel::Warranty, &["гарантия", "гарантийные обязательства"]),
    (
        SectionLabel::Liability,
        &["ответственность", "ответственность сторон", "материальная ответственность"],
    ),
    (
        SectionLabel::ForceMajeure,
        &["форс мажор", "обстоятельства непреодолимой силы", "непреодолимой силы"],
    ),
    (SectionLabel::Disputes, &["разрешение споров", "порядок разрешения споров", "спор"]),
    (
        SectionLabel::Term,
        &["срок действия", "срок действия договора", "срок договора"],
    ),
    (
        SectionLabel::Termination,
        &["расторжение договора", "расторжение", "изменение расторжение договора"],
    ),
    (SectionLabel::Confidentiality, &["конфиденциальность"]),
    (
        SectionLabel::Requisites,
        &["реквизиты сторон", "реквизиты", "юридические адреса", "адреса реквизиты сторон"],
    ),
    (SectionLabel::Signatures, &["подписи сторон", "подписи"]),
    (
        SectionLabel::Other,
        &["дополнительные условия", "прочие условия", "заключительные положения", "общие положения"],
    ),
];

/// Uzbek Cyrillic function words, weighed against Russian ones in Cyrillic windows
pub const UZ_CYRILLIC_STOPWORDS: &[&str] = &[
    "ва", "билан", "учун", "бўйича", "ёки", "ҳамда", "ушбу", "шартнома", "томонлар", "бўлган",
    "қилиш", "томонидан",
];

/// Russian function words
pub const RU_STOPWORDS: &[&str] = &[
    "и", "в", "на", "с", "по", "не", "для", "что", "или", "от", "настоящий", "договора",
    "стороны", "который", "является",
];

/// Pairs of phrases that, both present on one line, introduce the parties
pub const PARTY_INTRODUCTIONS: &[(&str, &[&str])] = &[
    ("bir tomondan", &["ikkinchi tomondan", "boshqa tomondan"]),
    ("бир томондан", &["иккинчи томондан", "бошқа томондан"]),
    ("с одной стороны", &["с другой стороны"]),
];

/// Contract words that mark a document title rather than a section heading
pub const TITLE_WORDS: &[&str] = &["shartnoma", "шартнома", "договор", "контракт", "kontrakt"];

/// Weight of a phrase coming from another language than the detected one
const FOREIGN_WEIGHT: f32 = 0.9;

#[derive(Debug, Clone)]
struct Entry {
    label: SectionLabel,
    words: Vec<String>,
    weight: f32,
}

/// Best match of a heading against one label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    /// Candidate label
    pub label: SectionLabel,
    /// Overlap ratio, weighted by language
    pub score: f32,
    /// Whether the winning phrase contains a contract title word
    pub phrase_has_title_word: bool,
}

/// Heading dictionary ordered for one detected language
///
/// Phrases of the detected language come first at full weight; the other two
/// languages follow at a reduced weight, so mixed-language documents still
/// segment.
#[derive(Debug, Clone)]
pub struct HeadingDictionary {
    entries: Vec<Entry>,
}

impl HeadingDictionary {
    /// Dictionary for a detected language
    pub fn for_language(language: Language) -> Self {
        let tables: [(Language, PhraseTable); 3] = [
            (Language::UzLatin, UZ_LATIN_HEADINGS),
            (Language::UzCyrillic, UZ_CYRILLIC_HEADINGS),
            (Language::Ru, RU_HEADINGS),
        ];

        let mut entries = Vec::new();
        let ordered = tables
            .iter()
            .filter(|(l, _)| *l == language)
            .chain(tables.iter().filter(|(l, _)| *l != language));
        for (table_language, table) in ordered {
            let weight = if *table_language == language { 1.0 } else { FOREIGN_WEIGHT };
            for (label, phrases) in table.iter() {
                for phrase in phrases.iter() {
                    entries.push(Entry {
                        label: *label,
                        words: content_words(phrase),
                        weight,
                    });
                }
            }
        }
        Self { entries }
    }

    /// Best score per label for a heading's content words, highest first
    ///
    /// A phrase counts only when every one of its words is found in the heading;
    /// its score is the share of heading words it explains. Labels with equal
    /// scores keep dictionary order.
    pub fn score(&self, heading_words: &[String]) -> Vec<LabelScore> {
        if heading_words.is_empty() {
            return Vec::new();
        }
        let mut best: Vec<LabelScore> = Vec::new();

        for entry in &self.entries {
            let all_found = entry
                .words
                .iter()
                .all(|p| heading_words.iter().any(|h| word_matches(h, p)));
            if !all_found || entry.words.is_empty() {
                continue;
            }
            let overlap = (entry.words.len() as f32 / heading_words.len() as f32).min(1.0);
            let score = overlap * entry.weight;
            let has_title_word = entry
                .words
                .iter()
                .any(|w| TITLE_WORDS.iter().any(|t| word_matches(w, t)));

            match best.iter_mut().find(|s| s.label == entry.label) {
                Some(existing) if existing.score < score => {
                    existing.score = score;
                    existing.phrase_has_title_word = has_title_word;
                }
                Some(_) => {}
                None => best.push(LabelScore {
                    label: entry.label,
                    score,
                    phrase_has_title_word: has_title_word,
                }),
            }
        }

        // Stable sort keeps dictionary order between equal scores
        best.sort_by(|a, b| b.score.total_cmp(&a.score));
        best
    }
}
