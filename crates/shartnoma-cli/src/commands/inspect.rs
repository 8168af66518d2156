//! Detect and sections command implementations.

use crate::cli::FileArgs;
use crate::commands::analyze::load_document;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use shartnoma_extract::TextExtractor;
use shartnoma_parser::{ContractParser, ParsedContract};

/// Execute the detect command.
pub async fn execute_detect(args: FileArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let (_, parsed) = read_and_parse(&args, config).await?;
    println!("{}", formatter.format_detection(&parsed)?);
    Ok(())
}

/// Execute the sections command.
pub async fn execute_sections(args: FileArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let (text, parsed) = read_and_parse(&args, config).await?;
    println!("{}", formatter.format_sections(&text, &parsed.sections)?);
    Ok(())
}

async fn read_and_parse(args: &FileArgs, config: &Config) -> Result<(String, ParsedContract)> {
    let document = load_document(&args.file)?;
    let extraction = TextExtractor::system(config.pipeline.ocr.clone())
        .extract(&document)
        .await?;
    if extraction.is_blank() {
        return Err(CliError::InvalidInput(format!("No text could be read from '{}'", args.file)));
    }

    let parser = ContractParser::new(config.pipeline.parser.clone());
    let parsed = parser.parse(&extraction.text, args.language.map(Into::into), None);
    Ok((extraction.text, parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LanguageArg;
    use shartnoma_domain::Language;

    fn file_args(dir: &tempfile::TempDir, name: &str, contents: &str) -> FileArgs {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        FileArgs {
            file: path.to_str().unwrap().to_string(),
            language: None,
        }
    }

    #[tokio::test]
    async fn test_detects_russian() {
        let dir = tempfile::tempdir().unwrap();
        let args = file_args(
            &dir,
            "dogovor.txt",
            "ДОГОВОР ОКАЗАНИЯ УСЛУГ\n1. ПРЕДМЕТ ДОГОВОРА\nИсполнитель обязуется оказать услуги, а Заказчик обязуется их оплатить.\n",
        );

        let (_, parsed) = read_and_parse(&args, &Config::default()).await.unwrap();
        assert_eq!(parsed.language.language, Language::Ru);
    }

    #[tokio::test]
    async fn test_declared_language_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = file_args(&dir, "matn.txt", "1. SHARTNOMA PREDMETI\nIjrochi xizmat ko'rsatadi.\n");
        args.language = Some(LanguageArg::UzLatin);

        let (text, parsed) = read_and_parse(&args, &Config::default()).await.unwrap();
        assert_eq!(parsed.language.language, Language::UzLatin);
        assert_eq!(parsed.sections.last().map(|s| s.end), Some(text.len()));
    }

    #[tokio::test]
    async fn test_blank_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = file_args(&dir, "blank.txt", "   \n\n");

        assert!(matches!(
            read_and_parse(&args, &Config::default()).await,
            Err(CliError::InvalidInput(_))
        ));
    }
}
