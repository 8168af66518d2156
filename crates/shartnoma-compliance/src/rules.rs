//! Statutory rule table
//!
//! Every rule names the statute it comes from, the contract types it applies to,
//! the section it inspects and how it inspects it.

use shartnoma_domain::{ContractType, LawCitation, SectionLabel, Severity};

/// Civil Code of the Republic of Uzbekistan
pub const CIVIL_CODE: &str = "O'zbekiston Respublikasi Fuqarolik kodeksi";

/// Labour Code of the Republic of Uzbekistan
pub const LABOUR_CODE: &str = "O'zbekiston Respublikasi Mehnat kodeksi";

/// Public Procurement Law
pub const PROCUREMENT_LAW: &str = "Davlat xaridlari to'g'risida qonun";

/// Article cited for a missing section when no rule targets its label
pub const GENERAL_CONTRACT_ARTICLE: &str = "354";

/// How a rule inspects the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCheck {
    /// The section must exist and mention at least one keyword
    Mandatory,
    /// The section should exist
    Recommended,
    /// No keyword may appear in the section
    Prohibited,
    /// Penalty percentages in the section must stay under the configured cap
    PenaltyCap,
    /// At least one keyword must appear somewhere in the document
    DocumentForm,
}

/// Contract types a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliesTo {
    /// Every contract type
    All,
    /// Only the listed types
    Only(&'static [ContractType]),
}

impl AppliesTo {
    /// Whether the rule applies to `contract_type`
    pub fn matches(&self, contract_type: ContractType) -> bool {
        match self {
            AppliesTo::All => true,
            AppliesTo::Only(types) => types.contains(&contract_type),
        }
    }
}

/// One statutory rule
#[derive(Debug, Clone, PartialEq)]
pub struct LegalRule {
    /// Stable identifier (`FK-354`)
    pub id: &'static str,
    /// Issue title (Uzbek)
    pub title: &'static str,
    /// Issue description (Uzbek)
    pub description: &'static str,
    /// Law name
    pub law_name: &'static str,
    /// Article number
    pub article: &'static str,
    /// Contract types the rule applies to
    pub applies_to: AppliesTo,
    /// Section the rule inspects; `None` means the whole document
    pub section: Option<SectionLabel>,
    /// Severity of a violation
    pub severity: Severity,
    /// Inspection kind
    pub check: RuleCheck,
    /// Lowercase keywords
    pub keywords: &'static [&'static str],
}

impl LegalRule {
    /// Citation of this rule's statute
    pub fn citation(&self) -> LawCitation {
        LawCitation::new(self.law_name, self.article)
    }
}

/// Built-in rules, evaluated in this order
pub const LEGAL_RULES: &[LegalRule] = &[
    LegalRule {
        id: "FK-354",
        title: "Shartnoma predmeti majburiy",
        description: "Shartnomada predmet (mavzu) aniq ko'rsatilishi shart",
        law_name: CIVIL_CODE,
        article: "354",
        applies_to: AppliesTo::All,
        section: Some(SectionLabel::Subject),
        severity: Severity::Critical,
        check: RuleCheck::Mandatory,
        keywords: &["predmet", "mavzu", "предмет", "обязуется", "majbur"],
    },
    LegalRule {
        id: "FK-355",
        title: "Tomonlar to'liq ko'rsatilishi shart",
        description: "Shartnoma tomonlarining to'liq nomi, manzili va rekvizitlari ko'rsatilishi kerak",
        law_name: CIVIL_CODE,
        article: "355",
        applies_to: AppliesTo::All,
        section: Some(SectionLabel::Parties),
        severity: Severity::Critical,
        check: RuleCheck::Mandatory,
        keywords: &[
            "tomon", "buyurtmachi", "ijrochi", "sotuvchi", "xaridor", "заказчик", "исполнитель",
            "сторон", "продавец", "покупатель", "томон",
        ],
    },
    LegalRule {
        id: "FK-356",
        title: "Narx sharti",
        description: "Shartnomada narx yoki narxni aniqlash tartibi ko'rsatilishi kerak",
        law_name: CIVIL_CODE,
        article: "356",
        applies_to: AppliesTo::All,
        section: Some(SectionLabel::Price),
        severity: Severity::High,
        check: RuleCheck::Mandatory,
        keywords: &["narx", "summa", "to'lov", "qiymat", "цена", "стоимость", "оплат", "сумм", "нарх"],
    },
    LegalRule {
        id: "FK-357",
        title: "Shartnoma muddati",
        description: "Shartnomaning amal qilish muddati belgilanishi kerak",
        law_name: CIVIL_CODE,
        article: "357",
        applies_to: AppliesTo::All,
        section: Some(SectionLabel::Term),
        severity: Severity::High,
        check: RuleCheck::Mandatory,
        keywords: &["muddat", "sana", "срок", "дата", "действует", "муддат"],
    },
    LegalRule {
        id: "FK-325",
        title: "Javobgarlikni cheklash",
        description: "Qasddan yetkazilgan zarar uchun javobgarlikni oldindan cheklash mumkin emas",
        law_name: CIVIL_CODE,
        article: "325",
        applies_to: AppliesTo::All,
        section: Some(SectionLabel::Liability),
        severity: Severity::Critical,
        check: RuleCheck::Prohibited,
        keywords: &[
            "javobgarlikdan ozod",
            "javobgar emas",
            "освобождается от ответственности",
            "освобождение от ответственности",
            "не несет ответственности",
        ],
    },
    LegalRule {
        id: "FK-417",
        title: "Mol sifati kafolati",
        description: "Mol yetkazib berish shartnomalarida kafolat muddati ko'rsatilishi kerak",
        law_name: CIVIL_CODE,
        article: "417",
        applies_to: AppliesTo::Only(&[ContractType::Supply]),
        section: Some(SectionLabel::Warranty),
        severity: Severity::High,
        check: RuleCheck::Mandatory,
        keywords: &["kafolat", "sifat", "гарант", "качеств"],
    },
    LegalRule {
        id: "FK-333",
        title: "Fors-major holatlari",
        description: "Fors-major holatlari va ularning oqibatlari belgilanishi tavsiya etiladi",
        law_name: CIVIL_CODE,
        article: "333",
        applies_to: AppliesTo::Only(&[
            ContractType::Supply,
            ContractType::Work,
            ContractType::Procurement,
        ]),
        section: Some(SectionLabel::ForceMajeure),
        severity: Severity::Medium,
        check: RuleCheck::Recommended,
        keywords: &["fors-major", "форс-мажор", "favqulodda"],
    },
    LegalRule {
        id: "FK-327",
        title: "Penya miqdori",
        description: "Penya miqdori qonunda belgilangan chegaradan oshmasligi kerak",
        law_name: CIVIL_CODE,
        article: "327",
        applies_to: AppliesTo::All,
        section: Some(SectionLabel::Liability),
        severity: Severity::High,
        check: RuleCheck::PenaltyCap,
        keywords: &["penya", "jarima", "neustoyka", "пеня", "пени", "неустойк", "штраф"],
    },
    LegalRule {
        id: "DX-25",
        title: "Davlat xaridi majburiy shartlari",
        description: "Davlat xaridlari shartnomalarida maxsus talablar bajarilishi shart",
        law_name: PROCUREMENT_LAW,
        article: "25",
        applies_to: AppliesTo::Only(&[ContractType::Procurement]),
        section: None,
        severity: Severity::Critical,
        check: RuleCheck::DocumentForm,
        keywords: &["davlat xarid", "государственн", "tender", "тендер", "xarid"],
    },
    LegalRule {
        id: "MK-72",
        title: "Mehnat shartnomasi majburiy shartlari",
        description: "Mehnat shartnomasi ish joyi, lavozim, ish haqi va ish vaqtini o'z ichiga olishi kerak",
        law_name: LABOUR_CODE,
        article: "72",
        applies_to: AppliesTo::Only(&[ContractType::Labor]),
        section: Some(SectionLabel::Subject),
        severity: Severity::Critical,
        check: RuleCheck::Mandatory,
        keywords: &["lavozim", "ish joyi", "mehnat", "должност", "труд", "ish haqi", "заработн"],
    },
    LegalRule {
        id: "FK-107",
        title: "Yozma shakl talabi",
        description: "Yuridik shaxslar orasidagi shartnomalar yozma shaklda tuzilishi va imzolanishi shart",
        law_name: CIVIL_CODE,
        article: "107",
        applies_to: AppliesTo::All,
        section: None,
        severity: Severity::Critical,
        check: RuleCheck::DocumentForm,
        keywords: &["imzo", "muhr", "подпис", "печать", "m.o.", "м.п.", "имзо"],
    },
    LegalRule {
        id: "FK-355-2",
        title: "Bank rekvizitlari",
        description: "Tomonlarning bank rekvizitlari to'liq ko'rsatilishi kerak",
        law_name: CIVIL_CODE,
        article: "355",
        applies_to: AppliesTo::All,
        section: Some(SectionLabel::Requisites),
        severity: Severity::High,
        check: RuleCheck::Mandatory,
        keywords: &["bank", "hisob raqam", "h/r", "mfo", "расчетный счет", "р/с", "мфо", "банк"],
    },
];

/// Rules that apply to a contract type
pub fn rules_for(contract_type: ContractType) -> impl Iterator<Item = &'static LegalRule> {
    LEGAL_RULES
        .iter()
        .filter(move |rule| rule.applies_to.matches(contract_type))
}

/// First mandatory rule that requires `label` for `contract_type`
pub fn mandatory_rule_for(contract_type: ContractType, label: SectionLabel) -> Option<&'static LegalRule> {
    rules_for(contract_type)
        .find(|rule| rule.check == RuleCheck::Mandatory && rule.section == Some(label))
}
