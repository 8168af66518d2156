//! Laws command implementation.

use crate::cli::{LawsAction, LawsArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use shartnoma_store::LawStore;
use std::fs;
use tracing::info;

/// Execute a statute store action.
pub async fn execute_laws(args: LawsArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let path = config.store_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut store = LawStore::new(&path)?;

    match args.action {
        LawsAction::Import { file } => {
            let json = fs::read_to_string(&file)?;
            let report = store.import_json(&json)?;
            info!(file = %file, imported = report.imported, skipped = report.skipped, "Laws imported");
            println!("{}", formatter.import_report(&report));
        }
        LawsAction::Count => {
            let count = store.count()?;
            println!("{}", formatter.info(&format!("{} article(s) in {}", count, path.display())));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    const LAWS: &str = r#"{
        "laws": [
            {
                "name": "Fuqarolik kodeksi",
                "articles": [
                    {"number": 333, "title": "Qarzdorning aybi", "content": "Qarzdor majburiyatni bajarmaganlik uchun aybi bo'lganda javob beradi."},
                    {"number": 382, "title": "Shartnoma tushunchasi", "content": "Ikki yoki bir necha shaxsning kelishuvi shartnoma deyiladi."}
                ]
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_import_then_count() {
        let dir = tempfile::tempdir().unwrap();
        let laws = dir.path().join("laws.json");
        fs::write(&laws, LAWS).unwrap();

        let mut config = Config::default();
        config.store.path = Some(dir.path().join("store").join("laws.db"));
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        execute_laws(
            LawsArgs {
                action: LawsAction::Import {
                    file: laws.to_str().unwrap().to_string(),
                },
            },
            &config,
            &formatter,
        )
        .await
        .unwrap();

        let store = LawStore::new(config.store_path().unwrap()).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        execute_laws(LawsArgs { action: LawsAction::Count }, &config, &formatter)
            .await
            .unwrap();
    }
}
