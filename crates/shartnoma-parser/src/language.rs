//! Language and script detection
//!
//! The text is cut into windows of roughly `window_chars` characters (on word
//! boundaries). Each window with enough letters votes for one language:
//!
//! - Latin majority → `uz_latin`
//! - Cyrillic majority → `ru` or `uz_cyrillic`, by script-specific letters
//!   (ы щ for Russian, ў қ ғ ҳ for Uzbek) and stop-word hits
//!
//! The language with most votes wins; ties go to `uz_latin`, then `uz_cyrillic`.
//! A short run of mis-recognized text only spoils its own window.

use crate::config::ParserConfig;
use crate::dictionary::{RU_STOPWORDS, UZ_CYRILLIC_STOPWORDS};
use crate::text::words;
use shartnoma_domain::{Language, LanguageDetection};
use tracing::debug;

/// Letters that occur in Russian but not in Uzbek Cyrillic
const RU_LETTERS: [char; 2] = ['ы', 'щ'];

/// Letters that occur in Uzbek Cyrillic but not in Russian
const UZ_LETTERS: [char; 4] = ['ў', 'қ', 'ғ', 'ҳ'];

/// Preference order on equal votes
const TIE_ORDER: [Language; 3] = [Language::UzLatin, Language::UzCyrillic, Language::Ru];

/// Windowed majority-vote language detector
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    window_chars: usize,
    min_letters: usize,
}

impl LanguageDetector {
    /// Detector using the window settings of `config`
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            window_chars: config.window_chars.max(1),
            min_letters: config.min_window_letters,
        }
    }

    /// Detect the language of `text`
    ///
    /// Confidence is the winner's share of votes. Text with no voting window
    /// yields `uz_latin` at confidence 0.
    pub fn detect(&self, text: &str) -> LanguageDetection {
        let windows = self.windows(text);
        let mut votes = [0usize; 3];
        let mut voters = 0usize;

        // A text shorter than one window still votes with what it has
        let min_letters = if windows.len() == 1 {
            1
        } else {
            self.min_letters
        };

        for window in &windows {
            if let Some(language) = vote(window, min_letters) {
                votes[index_of(language)] += 1;
                voters += 1;
            }
        }

        if voters == 0 {
            return LanguageDetection::fallback();
        }

        let max = votes.iter().copied().max().unwrap_or(0);
        let language = TIE_ORDER
            .iter()
            .copied()
            .find(|l| votes[index_of(*l)] == max)
            .unwrap_or(Language::UzLatin);

        debug!(
            "Language votes uz_latin={} uz_cyrillic={} ru={} → {}",
            votes[0],
            votes[1],
            votes[2],
            language.as_str()
        );

        LanguageDetection {
            language,
            confidence: max as f32 / voters as f32,
        }
    }

    /// Cut text into word-aligned windows
    fn windows<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut windows = Vec::new();
        let mut start: Option<usize> = None;
        let mut chars_in_window = 0usize;

        for (idx, ch) in text.char_indices() {
            if start.is_none() {
                if ch.is_whitespace() {
                    continue;
                }
                start = Some(idx);
                chars_in_window = 0;
            }
            chars_in_window += 1;
            if chars_in_window >= self.window_chars && ch.is_whitespace() {
                if let Some(s) = start.take() {
                    windows.push(&text[s..idx]);
                }
            }
        }
        if let Some(s) = start {
            windows.push(&text[s..]);
        }
        windows
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

fn index_of(language: Language) -> usize {
    match language {
        Language::UzLatin => 0,
        Language::UzCyrillic => 1,
        Language::Ru => 2,
    }
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}')
}

/// One window's vote, or `None` when it has too few letters
fn vote(window: &str, min_letters: usize) -> Option<Language> {
    let mut cyrillic = 0usize;
    let mut letters = 0usize;
    let mut ru_letters = 0usize;
    let mut uz_letters = 0usize;

    for c in window.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if is_cyrillic(c) {
            cyrillic += 1;
            let lower = c.to_lowercase().next().unwrap_or(c);
            if RU_LETTERS.contains(&lower) {
                ru_letters += 1;
            } else if UZ_LETTERS.contains(&lower) {
                uz_letters += 1;
            }
        }
    }

    if letters == 0 || letters < min_letters {
        return None;
    }
    if cyrillic * 2 <= letters {
        return Some(Language::UzLatin);
    }

    let tokens = words(window);
    let ru_stop = tokens.iter().filter(|w| RU_STOPWORDS.contains(&w.as_str())).count();
    let uz_stop = tokens
        .iter()
        .filter(|w| UZ_CYRILLIC_STOPWORDS.contains(&w.as_str()))
        .count();

    let ru_score = 2 * ru_letters + ru_stop;
    let uz_score = 2 * uz_letters + uz_stop;
    if ru_score > uz_score {
        Some(Language::Ru)
    } else {
        Some(Language::UzCyrillic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UZ_LATIN: &str = "Ushbu shartnoma Toshkent shahrida tuzildi. Buyurtmachi va Ijrochi \
        o'rtasida xizmat ko'rsatish bo'yicha kelishuvga erishildi hamda tomonlar quyidagilar \
        haqida kelishib oldilar.";
    const UZ_CYRILLIC: &str = "Ушбу шартнома Тошкент шаҳрида тузилди. Буюртмачи ва Ижрочи \
        ўртасида хизмат кўрсатиш бўйича келишувга эришилди ҳамда томонлар қуйидагилар ҳақида \
        келишиб олдилар.";
    const RUSSIAN: &str = "Настоящий договор заключен в городе Ташкенте. Заказчик и \
        Исполнитель, именуемые в дальнейшем стороны, договорились о нижеследующем: \
        исполнитель обязуется оказать услуги, а заказчик обязуется их оплатить.";

    #[test]
    fn test_detects_each_language() {
        let detector = LanguageDetector::default();
        assert_eq!(detector.detect(UZ_LATIN).language, Language::UzLatin);
        assert_eq!(detector.detect(UZ_CYRILLIC).language, Language::UzCyrillic);
        assert_eq!(detector.detect(RUSSIAN).language, Language::Ru);
    }

    #[test]
    fn test_empty_text_falls_back() {
        let detector = LanguageDetector::default();
        let detection = detector.detect("   \n 123 456 ");
        assert_eq!(detection.language, Language::UzLatin);
        assert_eq!(detection.confidence, 0.0);
    }

    #[test]
    fn test_noisy_prefix_does_not_flip_majority() {
        let config = ParserConfig {
            window_chars: 100,
            min_window_letters: 20,
            ..ParserConfig::default()
        };
        let detector = LanguageDetector::new(&config);
        let noise = "Шщыы щыщ ыщщ ыщы щыщ ыыщ щщы ыщы щыщ ыыщ щщы ыщы щыщ ыыщ щщы ыщы щыщ ыыщ щщы ыщы щыщ ыы";
        let text = format!("{} {} {} {}", noise, UZ_LATIN, UZ_LATIN, UZ_LATIN);

        let detection = detector.detect(&text);
        assert_eq!(detection.language, Language::UzLatin);
        assert!(detection.confidence > 0.5);
    }

    #[test]
    fn test_tie_prefers_uz_latin() {
        let config = ParserConfig {
            window_chars: 40,
            min_window_letters: 10,
            ..ParserConfig::default()
        };
        let detector = LanguageDetector::new(&config);
        let text = "Настоящий договор заключен в Ташкенте сегодня. Ushbu shartnoma Toshkentda tuzildi bugun va.";
        let detection = detector.detect(text);
        assert_eq!(detection.language, Language::UzLatin);
        assert_eq!(detection.confidence, 0.5);
    }
}
