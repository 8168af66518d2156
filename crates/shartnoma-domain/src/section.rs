//! Section module - labeled spans of contract text

use serde::{Deserialize, Serialize};

/// Semantic label of a contract section
///
/// Labels are declared in the canonical order of a well-formed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLabel {
    /// Preamble before the first recognised heading (title, number, date, city)
    Header,
    /// Identification of the parties
    Parties,
    /// Subject matter of the contract
    Subject,
    /// Rights of the parties
    Rights,
    /// Obligations of the parties
    Obligations,
    /// Price and payment terms
    Price,
    /// Delivery terms
    Delivery,
    /// Quality requirements
    Quality,
    /// Warranty
    Warranty,
    /// Liability and penalties
    Liability,
    /// Force majeure
    ForceMajeure,
    /// Dispute resolution
    Disputes,
    /// Term of the contract
    Term,
    /// Termination
    Termination,
    /// Confidentiality
    Confidentiality,
    /// Bank details and addresses of the parties
    Requisites,
    /// Signature block
    Signatures,
    /// Anything else (additional terms, unrecognised spans)
    Other,
}

impl SectionLabel {
    /// All labels in canonical order
    pub const ALL: [SectionLabel; 18] = [
        SectionLabel::Header,
        SectionLabel::Parties,
        SectionLabel::Subject,
        SectionLabel::Rights,
        SectionLabel::Obligations,
        SectionLabel::Price,
        SectionLabel::Delivery,
        SectionLabel::Quality,
        SectionLabel::Warranty,
        SectionLabel::Liability,
        SectionLabel::ForceMajeure,
        SectionLabel::Disputes,
        SectionLabel::Term,
        SectionLabel::Termination,
        SectionLabel::Confidentiality,
        SectionLabel::Requisites,
        SectionLabel::Signatures,
        SectionLabel::Other,
    ];

    /// Get the label name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionLabel::Header => "header",
            SectionLabel::Parties => "parties",
            SectionLabel::Subject => "subject",
            SectionLabel::Rights => "rights",
            SectionLabel::Obligations => "obligations",
            SectionLabel::Price => "price",
            SectionLabel::Delivery => "delivery",
            SectionLabel::Quality => "quality",
            SectionLabel::Warranty => "warranty",
            SectionLabel::Liability => "liability",
            SectionLabel::ForceMajeure => "force_majeure",
            SectionLabel::Disputes => "disputes",
            SectionLabel::Term => "term",
            SectionLabel::Termination => "termination",
            SectionLabel::Confidentiality => "confidentiality",
            SectionLabel::Requisites => "requisites",
            SectionLabel::Signatures => "signatures",
            SectionLabel::Other => "other",
        }
    }

    /// Parse a label name
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "dispute" => return Some(SectionLabel::Disputes),
            "confidential" => return Some(SectionLabel::Confidentiality),
            "additional" => return Some(SectionLabel::Other),
            _ => {}
        }
        Self::ALL.iter().copied().find(|l| l.as_str() == s)
    }

    /// Uzbek display title used in reports
    pub fn title_uz(&self) -> &'static str {
        match self {
            SectionLabel::Header => "Sarlavha",
            SectionLabel::Parties => "Tomonlar",
            SectionLabel::Subject => "Shartnoma predmeti",
            SectionLabel::Rights => "Tomonlarning huquqlari",
            SectionLabel::Obligations => "Tomonlarning majburiyatlari",
            SectionLabel::Price => "Narx va to'lov tartibi",
            SectionLabel::Delivery => "Yetkazib berish",
            SectionLabel::Quality => "Sifat",
            SectionLabel::Warranty => "Kafolat",
            SectionLabel::Liability => "Javobgarlik",
            SectionLabel::ForceMajeure => "Fors-major",
            SectionLabel::Disputes => "Nizolarni hal qilish",
            SectionLabel::Term => "Shartnoma muddati",
            SectionLabel::Termination => "Bekor qilish",
            SectionLabel::Confidentiality => "Maxfiylik",
            SectionLabel::Requisites => "Rekvizitlar",
            SectionLabel::Signatures => "Imzolar",
            SectionLabel::Other => "Boshqa",
        }
    }
}

impl std::str::FromStr for SectionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid section label: {}", s))
    }
}

/// A numbered clause inside a section (e.g. "4.2.")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    /// Clause number as written ("4.2")
    pub number: String,
    /// Byte offset of the clause start in the source text
    pub start: usize,
    /// Byte offset one past the clause end
    pub end: usize,
}

/// A contiguous span of the extracted text classified under one label
///
/// Offsets are byte offsets into the source text and always fall on character
/// boundaries. Sections produced by the segmenter are disjoint, sorted and cover
/// the whole text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Semantic label
    pub label: SectionLabel,

    /// Byte offset of the first character
    pub start: usize,

    /// Byte offset one past the last character
    pub end: usize,

    /// Classification confidence in [0.0, 1.0]
    pub confidence: f32,

    /// Heading line that opened the section, if any
    pub heading: Option<String>,

    /// Numbered clauses found inside the span
    #[serde(default)]
    pub clauses: Vec<Clause>,
}

impl Section {
    /// Create a section without heading or clauses
    pub fn new(label: SectionLabel, start: usize, end: usize, confidence: f32) -> Self {
        Self {
            label,
            start,
            end,
            confidence,
            heading: None,
            clauses: Vec::new(),
        }
    }

    /// Borrow the section's text from the source it was cut from
    ///
    /// Returns an empty string when the offsets do not fit the given source.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }

    /// Span length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
