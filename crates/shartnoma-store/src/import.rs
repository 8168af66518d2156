//! JSON import format for law articles
//!
//! ```json
//! { "laws": [ { "name": "...", "short_name": "FK",
//!     "articles": [ { "number": "356", "title": "...", "content": "...", "keywords": ["narx"] } ] } ] }
//! ```

use crate::{LawArticle, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Top-level import document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawFile {
    /// Laws in the file
    pub laws: Vec<LawEntry>,
}

/// One law and its articles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawEntry {
    /// Full law name
    pub name: String,
    /// Short name used in citations
    #[serde(default)]
    pub short_name: String,
    /// Articles of the law
    #[serde(default)]
    pub articles: Vec<ArticleEntry>,
}

/// One article in the import document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleEntry {
    /// Article number (string or integer in the source file)
    #[serde(deserialize_with = "number_or_string")]
    pub number: String,
    /// Article title
    #[serde(default)]
    pub title: String,
    /// Article text
    pub content: String,
    /// Search keywords
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Counts produced by an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Laws processed
    pub laws: usize,
    /// Articles written
    pub imported: usize,
    /// Articles skipped for missing fields
    pub skipped: usize,
}

fn number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "article number must be a string or integer, got {}",
            other
        ))),
    }
}

/// Walk a law file and hand every valid article to `write`
pub(crate) fn import_file<F>(file: &LawFile, mut write: F) -> Result<ImportReport, StoreError>
where
    F: FnMut(&LawArticle) -> Result<(), StoreError>,
{
    let mut report = ImportReport::default();

    for law in &file.laws {
        if law.name.trim().is_empty() {
            warn!("Skipping law without a name ({} articles)", law.articles.len());
            report.skipped += law.articles.len();
            continue;
        }
        report.laws += 1;

        for entry in &law.articles {
            if entry.number.trim().is_empty() || entry.content.trim().is_empty() {
                warn!("Skipping article without number or content in '{}'", law.name);
                report.skipped += 1;
                continue;
            }
            let article = LawArticle {
                id: None,
                law_name: law.name.trim().to_string(),
                short_name: law.short_name.trim().to_string(),
                article_number: entry.number.trim().to_string(),
                title: entry.title.trim().to_string(),
                content: entry.content.trim().to_string(),
                keywords: entry.keywords.clone(),
            };
            write(&article)?;
            report.imported += 1;
        }
    }

    info!(
        "Imported {} articles from {} laws ({} skipped)",
        report.imported, report.laws, report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LawStore;

    const SAMPLE: &str = r#"{
        "laws": [
            {
                "name": "O'zbekiston Respublikasi Fuqarolik kodeksi",
                "short_name": "FK",
                "articles": [
                    {"number": 356, "title": "Narx", "content": "Shartnomani bajarish narx bo'yicha amalga oshiriladi.", "keywords": ["narx", "to'lov"]},
                    {"number": "327", "title": "Neustoyka", "content": "Neustoyka qonun yoki shartnoma bilan belgilanadi."},
                    {"number": "1", "content": "  "}
                ]
            },
            {"name": "", "articles": [{"number": "2", "content": "x"}]}
        ]
    }"#;

    #[test]
    fn test_import_counts() {
        let mut store = LawStore::new(":memory:").unwrap();
        let report = store.import_json(SAMPLE).unwrap();

        assert_eq!(report.laws, 1);
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_import_twice_is_stable() {
        let mut store = LawStore::new(":memory:").unwrap();
        store.import_json(SAMPLE).unwrap();
        store.import_json(SAMPLE).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        let price = store.find("FK", "356").unwrap().unwrap();
        assert_eq!(price.keywords, vec!["narx".to_string(), "to'lov".to_string()]);
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        let mut store = LawStore::new(":memory:").unwrap();
        let result = store.import_json("{\"laws\": 5}");
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
        assert_eq!(store.count().unwrap(), 0);
    }
}
