//! Post-OCR normalization of look-alike letters
//!
//! Recognizers running with Latin and Cyrillic models at once often emit words
//! that mix both scripts, e.g. "shartnoma" with a Cyrillic "о". Each mixed word
//! is rewritten into its majority script using a fixed table of visually
//! identical letters. Letters without a twin are left as they are.

/// (Cyrillic, Latin) pairs that render identically in common fonts
const LOOKALIKES: &[(char, char)] = &[
    ('а', 'a'),
    ('е', 'e'),
    ('о', 'o'),
    ('р', 'p'),
    ('с', 'c'),
    ('у', 'y'),
    ('х', 'x'),
    ('к', 'k'),
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

/// Apostrophe variants folded into U+02BB (Uzbek "o‘", "g‘")
const TURNED_COMMA_VARIANTS: &[char] = &['\u{2018}', '`', '\u{00B4}'];

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}')
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '\u{00C0}'..='\u{024F}')
}

fn to_latin(c: char) -> Option<char> {
    LOOKALIKES.iter().find(|(cyr, _)| *cyr == c).map(|(_, lat)| *lat)
}

fn to_cyrillic(c: char) -> Option<char> {
    LOOKALIKES.iter().find(|(_, lat)| *lat == c).map(|(cyr, _)| *cyr)
}

/// Result of one correction pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corrected {
    /// Normalized text
    pub text: String,
    /// Number of letters replaced
    pub substitutions: usize,
}

/// Normalize mixed-script words and apostrophe variants
///
/// Deterministic and idempotent: running it on its own output changes nothing.
pub fn correct_lookalikes(text: &str) -> Corrected {
    let mut out = String::with_capacity(text.len());
    let mut substitutions = 0;
    let mut word = String::new();

    for c in text.chars() {
        if c.is_alphabetic() {
            word.push(c);
            continue;
        }
        substitutions += flush_word(&mut word, &mut out);
        if TURNED_COMMA_VARIANTS.contains(&c) && out.chars().last().is_some_and(is_latin) {
            out.push('\u{02BB}');
            substitutions += 1;
        } else {
            out.push(c);
        }
    }
    substitutions += flush_word(&mut word, &mut out);

    Corrected {
        text: out,
        substitutions,
    }
}

fn flush_word(word: &mut String, out: &mut String) -> usize {
    if word.is_empty() {
        return 0;
    }
    let latin = word.chars().filter(|c| is_latin(*c)).count();
    let cyrillic = word.chars().filter(|c| is_cyrillic(*c)).count();

    let mut replaced = 0;
    if latin > 0 && cyrillic > 0 && latin != cyrillic {
        let into_latin = latin > cyrillic;
        for c in word.chars() {
            let swapped = if into_latin && is_cyrillic(c) {
                to_latin(c)
            } else if !into_latin && is_latin(c) {
                to_cyrillic(c)
            } else {
                None
            };
            match swapped {
                Some(s) => {
                    out.push(s);
                    replaced += 1;
                }
                None => out.push(c),
            }
        }
    } else {
        out.push_str(word);
    }
    word.clear();
    replaced
}
