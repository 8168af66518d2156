//! Shartnoma Contract Parser
//!
//! Rule-based analysis of extracted contract text:
//!
//! - [`LanguageDetector`]: windowed majority vote between Uzbek Latin, Uzbek
//!   Cyrillic and Russian
//! - [`Segmenter`]: line-by-line state machine producing labeled, contiguous
//!   sections with their numbered clauses
//! - [`metadata`]: contract number, date, parties, INN, amount and currency
//! - [`contract_type`]: keyword-based contract type and the validity check
//!
//! Nothing here fails: every function returns a best-effort answer for any input.
//!
//! # Examples
//!
//! ```
//! use shartnoma_domain::SectionLabel;
//! use shartnoma_parser::ContractParser;
//!
//! let text = "SHARTNOMA\n1. SHARTNOMA PREDMETI\nIjrochi xizmat ko'rsatadi.\n";
//! let parsed = ContractParser::default().parse(text, None, None);
//! assert_eq!(parsed.sections.last().unwrap().label, SectionLabel::Subject);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod contract_type;
pub mod dictionary;
pub mod language;
pub mod metadata;
pub mod segmenter;
pub mod text;

pub use config::ParserConfig;
pub use contract_type::{detect_contract_type, is_contract, resolve_contract_type};
pub use language::LanguageDetector;
pub use metadata::extract_metadata;
pub use segmenter::Segmenter;

use shartnoma_domain::{ContractMetadata, ContractType, Language, LanguageDetection, Section};

/// Everything the parser learns from one text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedContract {
    /// Language used for segmentation (declared or detected)
    pub language: LanguageDetection,
    /// Sections in source order, covering the whole text
    pub sections: Vec<Section>,
    /// Extracted metadata
    pub metadata: ContractMetadata,
    /// Declared or detected contract type
    pub contract_type: ContractType,
    /// Whether the text reads as a contract
    pub is_contract: bool,
}

/// Runs detection, segmentation and metadata extraction in one pass
#[derive(Debug, Clone)]
pub struct ContractParser {
    detector: LanguageDetector,
    segmenter: Segmenter,
}

impl ContractParser {
    /// Create a parser
    pub fn new(config: ParserConfig) -> Self {
        Self {
            detector: LanguageDetector::new(&config),
            segmenter: Segmenter::new(config),
        }
    }

    /// Detect the language of `text`
    pub fn detect_language(&self, text: &str) -> LanguageDetection {
        self.detector.detect(text)
    }

    /// Segment `text` written in `language`
    pub fn segment(&self, text: &str, language: Language) -> Vec<Section> {
        self.segmenter.segment(text, language)
    }

    /// Parse `text`; declared values win over detection
    pub fn parse(
        &self,
        text: &str,
        declared_language: Option<Language>,
        declared_type: Option<ContractType>,
    ) -> ParsedContract {
        let language = match declared_language {
            Some(language) => LanguageDetection {
                language,
                confidence: 1.0,
            },
            None => self.detect_language(text),
        };
        let sections = self.segment(text, language.language);
        let metadata = extract_metadata(text, language.language);
        let contract_type = resolve_contract_type(declared_type, text);
        let is_contract = is_contract(text, contract_type);

        ParsedContract {
            language,
            sections,
            metadata,
            contract_type,
            is_contract,
        }
    }
}

impl Default for ContractParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}
