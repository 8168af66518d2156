//! Prompt construction for the legal review of one section

use shartnoma_domain::traits::RetrievedPassage;
use shartnoma_domain::{ContractType, Language, SectionLabel};

/// JSON schema the model answer must follow
pub const ISSUE_SCHEMA: &str = r#"{
  "type": "object",
  "required": ["issues"],
  "properties": {
    "summary": { "type": "string" },
    "issues": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["issue_type", "severity", "title", "description"],
        "properties": {
          "issue_type": {
            "type": "string",
            "enum": ["missing_mandatory_section", "unlawful_clause", "one_sided", "ambiguous_term", "missing_info", "conflict", "other"]
          },
          "severity": { "type": "string", "enum": ["critical", "high", "medium", "low", "info"] },
          "title": { "type": "string" },
          "description": { "type": "string" },
          "law_name": { "type": "string" },
          "article": { "type": "string" },
          "suggestion": { "type": "string" },
          "excerpt": { "type": "string" }
        }
      }
    }
  }
}"#;

const SYSTEM_INSTRUCTIONS: &str = "Siz O'zbekiston Respublikasi qonunchiligi bo'yicha ekspert yuridik yordamchisiz.
Shartnoma bandini faqat quyidagi qonun moddalariga tayangan holda tahlil qiling.
Har bir muammo uchun turi, jiddiyligi, sarlavhasi va izohini ko'rsating.
Muammo topilmasa, bo'sh ro'yxat qaytaring. Noma'lum bo'lsa, taxmin qilmang.";

const OUTPUT_FORMAT_REMINDER: &str = r#"Javob formati (faqat JSON, boshqa matn qo'shmang):
{
  "summary": "bandning qisqa bahosi",
  "issues": [
    {
      "issue_type": "unlawful_clause",
      "severity": "high",
      "title": "...",
      "description": "...",
      "law_name": "...",
      "article": "...",
      "suggestion": "...",
      "excerpt": "..."
    }
  ]
}"#;

/// Builds the review prompt for one section
pub struct PromptBuilder<'a> {
    section_text: &'a str,
    label: SectionLabel,
    language: Language,
    contract_type: ContractType,
    passages: &'a [RetrievedPassage],
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt for a section's text
    pub fn new(section_text: &'a str, label: SectionLabel, language: Language) -> Self {
        Self {
            section_text,
            label,
            language,
            contract_type: ContractType::Other,
            passages: &[],
        }
    }

    /// Name the contract type in the prompt
    pub fn with_contract_type(mut self, contract_type: ContractType) -> Self {
        self.contract_type = contract_type;
        self
    }

    /// Add retrieved statutory passages as context
    pub fn with_passages(mut self, passages: &'a [RetrievedPassage]) -> Self {
        self.passages = passages;
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(SYSTEM_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("KONTEKST (Tegishli qonun moddalari):\n");
        if self.passages.is_empty() {
            prompt.push_str("Tegishli moddalar topilmadi.\n");
        } else {
            let context: Vec<String> = self
                .passages
                .iter()
                .map(|p| {
                    format!(
                        "Qonun: {}\nModda: {}\nMatn: {}",
                        p.citation.law_name, p.citation.article, p.content
                    )
                })
                .collect();
            prompt.push_str(&context.join("\n\n"));
            prompt.push('\n');
        }
        prompt.push('\n');

        prompt.push_str(&format!("Shartnoma turi: {}\n", self.contract_type.display_name()));
        prompt.push_str(&format!("Til: {}\n", self.language.display_name()));
        prompt.push_str(&format!("Bo'lim: {}\n\n", self.label.title_uz()));

        prompt.push_str("BAND:\n---\n");
        prompt.push_str(self.section_text);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }
}

/// Cut `text` to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shartnoma_domain::LawCitation;

    fn passage(article: &str, content: &str) -> RetrievedPassage {
        RetrievedPassage {
            citation: LawCitation::new("Fuqarolik kodeksi", article),
            title: String::new(),
            content: content.to_string(),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_prompt_includes_section_and_context() {
        let passages = vec![passage("327", "Penya miqdori"), passage("333", "Fors-major")];
        let prompt = PromptBuilder::new("Penya 60%", SectionLabel::Liability, Language::UzLatin)
            .with_contract_type(ContractType::Service)
            .with_passages(&passages)
            .build();

        assert!(prompt.contains("Penya 60%"));
        assert!(prompt.contains("Qonun: Fuqarolik kodeksi\nModda: 327\nMatn: Penya miqdori"));
        assert!(prompt.contains("Modda: 333"));
        assert!(prompt.contains("Bo'lim: Javobgarlik"));
        assert!(prompt.contains("\"issues\""));
    }

    #[test]
    fn test_prompt_without_passages() {
        let prompt = PromptBuilder::new("Matn", SectionLabel::Price, Language::Ru).build();
        assert!(prompt.contains("Tegishli moddalar topilmadi"));
        assert!(!prompt.contains("Modda:"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("абвгд", 3), "абв");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(ISSUE_SCHEMA).unwrap();
        assert_eq!(schema["properties"]["issues"]["items"]["required"][1], "severity");
    }
}
