//! Section segmentation
//!
//! A line-by-line state machine. Each heading-shaped line (numbered, all caps, or
//! short without sentence punctuation) is scored against the heading dictionary;
//! a good enough match opens a new section and every following line belongs to
//! it until the next match. Text before the first heading is the `header`.
//!
//! The output always covers the input: sections are sorted, disjoint and
//! contiguous, from offset 0 to `text.len()`.

use crate::config::ParserConfig;
use crate::dictionary::{HeadingDictionary, LabelScore, PARTY_INTRODUCTIONS, TITLE_WORDS};
use crate::text::{content_words, fold_apostrophes, word_matches};
use regex::Regex;
use shartnoma_domain::{Clause, Language, Section, SectionLabel};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

static NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,2}|[IVX]{1,5})[.)]\s*").expect("numbering regex"));

static CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(\d+(?:\.\d+)*)[.:)]\s").expect("clause regex"));

const HEADER_CONFIDENCE: f32 = 0.9;
const PARTY_INTRO_CONFIDENCE: f32 = 0.7;
const FALLBACK_CONFIDENCE: f32 = 0.2;

/// Shape of a line that may be a heading
#[derive(Debug, Clone, PartialEq)]
struct HeadingShape<'a> {
    numbered: bool,
    rest: &'a str,
}

#[derive(Debug, Clone)]
struct Boundary {
    start: usize,
    label: SectionLabel,
    confidence: f32,
    heading: Option<String>,
}

/// Rule-based contract segmenter
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: ParserConfig,
}

impl Segmenter {
    /// Create a segmenter
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Split `text` into labeled sections
    ///
    /// Never fails; text without a recognizable heading becomes one `other`
    /// section. Empty text yields no sections.
    pub fn segment(&self, text: &str, language: Language) -> Vec<Section> {
        if text.is_empty() {
            return Vec::new();
        }

        let dictionary = HeadingDictionary::for_language(language);
        let mut boundaries: Vec<Boundary> = Vec::new();
        let mut seen: HashSet<SectionLabel> = HashSet::new();
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let in_preamble = boundaries.is_empty();
            if let Some((label, score)) = self.match_heading(trimmed, &dictionary, &seen, in_preamble) {
                debug!("Heading {:?} → {} ({:.2})", trimmed, label.as_str(), score);
                seen.insert(label);
                boundaries.push(Boundary {
                    start: line_start,
                    label,
                    confidence: (0.5 + 0.5 * score).min(1.0),
                    heading: Some(trimmed.to_string()),
                });
            } else if in_preamble && is_party_introduction(trimmed) {
                seen.insert(SectionLabel::Parties);
                boundaries.push(Boundary {
                    start: line_start,
                    label: SectionLabel::Parties,
                    confidence: PARTY_INTRO_CONFIDENCE,
                    heading: None,
                });
            }
        }

        if boundaries.is_empty() {
            debug!("No headings found, whole text is one section");
            let mut section = Section::new(SectionLabel::Other, 0, text.len(), FALLBACK_CONFIDENCE);
            section.clauses = clauses(text, 0, text.len());
            return vec![section];
        }

        if boundaries[0].start > 0 {
            if text[..boundaries[0].start].trim().is_empty() {
                boundaries[0].start = 0;
            } else {
                boundaries.insert(
                    0,
                    Boundary {
                        start: 0,
                        label: SectionLabel::Header,
                        confidence: HEADER_CONFIDENCE,
                        heading: None,
                    },
                );
            }
        }

        let mut sections = Vec::with_capacity(boundaries.len());
        for (idx, boundary) in boundaries.iter().enumerate() {
            let end = boundaries.get(idx + 1).map(|b| b.start).unwrap_or(text.len());
            let mut section = Section::new(boundary.label, boundary.start, end, boundary.confidence);

            // Clauses start after the heading line
            let body_start = match &boundary.heading {
                Some(_) => text[boundary.start..end]
                    .find('\n')
                    .map(|i| boundary.start + i + 1)
                    .unwrap_or(end),
                None => boundary.start,
            };
            section.clauses = clauses(text, body_start, end);
            section.heading = boundary.heading.clone();
            sections.push(section);
        }

        debug!("Segmented into {} sections", sections.len());
        sections
    }

    /// Label of a heading line, with its overlap score
    fn match_heading(
        &self,
        line: &str,
        dictionary: &HeadingDictionary,
        seen: &HashSet<SectionLabel>,
        in_preamble: bool,
    ) -> Option<(SectionLabel, f32)> {
        let shape = self.heading_shape(line)?;
        let words = content_words(shape.rest);

        let scores: Vec<LabelScore> = dictionary
            .score(&words)
            .into_iter()
            .filter(|s| s.score >= self.config.min_heading_overlap)
            .collect();
        let best = scores.first()?;

        // "YETKAZIB BERISH SHARTNOMASI" at the top is the document title
        let names_contract = words
            .iter()
            .any(|w| TITLE_WORDS.iter().any(|t| word_matches(w, t)));
        if in_preamble && !shape.numbered && names_contract && !best.phrase_has_title_word {
            return None;
        }

        let tied: Vec<&LabelScore> = scores
            .iter()
            .filter(|s| (best.score - s.score).abs() < f32::EPSILON)
            .collect();
        let chosen = tied
            .iter()
            .find(|s| !seen.contains(&s.label))
            .copied()
            .unwrap_or(best);
        Some((chosen.label, chosen.score))
    }

    fn heading_shape<'a>(&self, line: &'a str) -> Option<HeadingShape<'a>> {
        if line.chars().count() > self.config.max_heading_chars {
            return None;
        }

        let (numbered, rest) = match NUMBERING.find(line) {
            Some(m) if !line[m.end()..].starts_with(|c: char| c.is_ascii_digit()) => {
                (true, &line[m.end()..])
            }
            _ => (false, line),
        };
        // "2.1." clauses and dates
        if !numbered && rest.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        let letters: Vec<char> = rest.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.len() < 3 {
            return None;
        }
        let word_count = rest.split_whitespace().count();
        if word_count > self.config.max_heading_words {
            return None;
        }

        let all_caps = letters.iter().all(|c| !c.is_lowercase());
        let ends_sentence = rest.trim_end().ends_with(['.', ';', ',']);
        let short_title = word_count <= 6 && !ends_sentence;

        if numbered || all_caps || short_title {
            Some(HeadingShape { numbered, rest })
        } else {
            None
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

/// "bir tomondan ... ikkinchi tomondan" on one line
fn is_party_introduction(line: &str) -> bool {
    let lower = fold_apostrophes(&line.to_lowercase());
    PARTY_INTRODUCTIONS
        .iter()
        .any(|(first, others)| lower.contains(first) && others.iter().any(|o| lower.contains(o)))
}

/// Numbered clauses (`1.`, `2.3)`, `4.1.2:`) between `start` and `end`
fn clauses(text: &str, start: usize, end: usize) -> Vec<Clause> {
    if start >= end {
        return Vec::new();
    }
    let body = &text[start..end];
    let starts: Vec<(usize, String)> = CLAUSE
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| (start + m.start(), m.as_str().to_string())))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(idx, (clause_start, number))| Clause {
            number: number.clone(),
            start: *clause_start,
            end: starts.get(idx + 1).map(|(s, _)| *s).unwrap_or(end),
        })
        .collect()
}
