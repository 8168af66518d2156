//! Token helpers shared by detection, segmentation and metadata extraction

/// Apostrophe variants used for the Uzbek Latin `o'` and `g'` letters
const APOSTROPHES: [char; 6] = ['\u{2018}', '\u{2019}', '\u{02BB}', '\u{02BC}', '`', '\u{00B4}'];

/// Replace every apostrophe variant with ASCII `'`
pub fn fold_apostrophes(text: &str) -> String {
    text.chars()
        .map(|c| if APOSTROPHES.contains(&c) { '\'' } else { c })
        .collect()
}

/// Lowercased words with apostrophes folded
///
/// Letters, digits and inner apostrophes form words; everything else separates.
pub fn words(text: &str) -> Vec<String> {
    fold_apostrophes(&text.to_lowercase())
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Words that can carry meaning in a heading (3+ characters, not a number)
pub fn content_words(text: &str) -> Vec<String> {
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() >= 3 && !w.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// Whether a text word is an inflected form of a dictionary word
///
/// Dictionary words of six or more characters lose their last letter before the
/// prefix comparison, so `javobgarlik` also matches `javobgarligi`.
pub fn word_matches(word: &str, dictionary_word: &str) -> bool {
    let len = dictionary_word.chars().count();
    if len >= 6 {
        let stem: String = dictionary_word.chars().take(len - 1).collect();
        word.starts_with(&stem)
    } else {
        word.starts_with(dictionary_word)
    }
}
