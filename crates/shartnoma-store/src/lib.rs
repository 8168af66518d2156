//! Shartnoma Legal Corpus Store
//!
//! Read-only reference corpus of statutory articles used by the compliance
//! review: SQLite for the article table, an HNSW index for similarity search.
//!
//! # Architecture
//!
//! - SQLite holds the articles (law name, article number, title, text, keywords)
//! - `LawCorpus` loads the table once, embeds every article and builds the index
//! - The index is rebuilt from SQLite on startup; it is never persisted
//!
//! # Examples
//!
//! ```no_run
//! use shartnoma_store::{LawStore, LawCorpus};
//! use shartnoma_store::embedding::HashingEmbeddingModel;
//!
//! let store = LawStore::new("laws.db").unwrap();
//! let corpus = LawCorpus::build(&store, HashingEmbeddingModel::new(384)).unwrap();
//! println!("{} articles indexed", corpus.len());
//! ```

#![warn(missing_docs)]

pub mod corpus;
pub mod embedding;
pub mod import;
pub mod vector_index;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub use corpus::LawCorpus;
pub use import::{ImportReport, LawFile};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Article not found
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Embedding or index failure
    #[error("Index error: {0}")]
    Index(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// One article of a law
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawArticle {
    /// Row id (absent before insertion)
    pub id: Option<i64>,
    /// Full law name ("O'zbekiston Respublikasi Fuqarolik kodeksi")
    pub law_name: String,
    /// Short law name ("FK")
    pub short_name: String,
    /// Article number as written
    pub article_number: String,
    /// Article title
    pub title: String,
    /// Article text
    pub content: String,
    /// Search keywords
    pub keywords: Vec<String>,
}

impl LawArticle {
    /// Text fed to the embedding model
    pub fn embedding_text(&self) -> String {
        format!("{} {} {}", self.title, self.keywords.join(" "), self.content)
    }
}

/// SQLite-backed article table
///
/// SQLite connections are not thread-safe; the store is used to load the corpus
/// and to import data, not from the pipeline's worker tasks.
pub struct LawStore {
    conn: Connection,
}

impl LawStore {
    /// Open (or create) a store at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS law_articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                law_name TEXT NOT NULL,
                short_name TEXT NOT NULL DEFAULT '',
                article_number TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                keywords TEXT NOT NULL DEFAULT '[]',
                UNIQUE(law_name, article_number)
            );
            CREATE INDEX IF NOT EXISTS idx_law_articles_short
                ON law_articles(short_name, article_number);",
        )?;
        Ok(())
    }

    /// Insert or update an article keyed by (law name, article number)
    ///
    /// Returns the row id. Importing the same data twice leaves the table unchanged.
    pub fn upsert_article(&self, article: &LawArticle) -> Result<i64, StoreError> {
        if article.law_name.trim().is_empty() || article.article_number.trim().is_empty() {
            return Err(StoreError::InvalidData(
                "law_name and article_number are required".to_string(),
            ));
        }
        let id = upsert_row(&self.conn, article)?;
        debug!("Upserted article {} of '{}' as row {}", article.article_number, article.law_name, id);
        Ok(id)
    }

    /// Load every article, ordered by row id
    pub fn all_articles(&self) -> Result<Vec<LawArticle>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, law_name, short_name, article_number, title, content, keywords
             FROM law_articles ORDER BY id",
        )?;
        let rows = stmt.query_map([], Self::row_to_raw)?;
        let mut articles = Vec::new();
        for row in rows {
            articles.push(Self::raw_to_article(row?)?);
        }
        Ok(articles)
    }

    /// Number of stored articles
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM law_articles", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Import a JSON law file inside one transaction
    pub fn import_json(&mut self, json: &str) -> Result<ImportReport, StoreError> {
        let file: LawFile = serde_json::from_str(json)?;
        let tx = self.conn.transaction()?;
        let report = import::import_file(&file, |article| upsert_row(&tx, article).map(|_| ()))?;
        tx.commit()?;
        Ok(report)
    }

    fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawArticle> {
        Ok(RawArticle {
            id: row.get(0)?,
            law_name: row.get(1)?,
            short_name: row.get(2)?,
            article_number: row.get(3)?,
            title: row.get(4)?,
            content: row.get(5)?,
            keywords: row.get(6)?,
        })
    }

    fn raw_to_article(raw: RawArticle) -> Result<LawArticle, StoreError> {
        Ok(LawArticle {
            id: Some(raw.id),
            law_name: raw.law_name,
            short_name: raw.short_name,
            article_number: raw.article_number,
            title: raw.title,
            content: raw.content,
            keywords: serde_json::from_str(&raw.keywords)?,
        })
    }
}

struct RawArticle {
    id: i64,
    law_name: String,
    short_name: String,
    article_number: String,
    title: String,
    content: String,
    keywords: String,
}

/// Point lookups used by the store tests
#[cfg(test)]
impl LawStore {
    /// Get an article by row id
    pub(crate) fn get(&self, id: i64) -> Result<Option<LawArticle>, StoreError> {
        use rusqlite::OptionalExtension;

        let row = self
            .conn
            .query_row(
                "SELECT id, law_name, short_name, article_number, title, content, keywords
                 FROM law_articles WHERE id = ?1",
                params![id],
                Self::row_to_raw,
            )
            .optional()?;
        row.map(Self::raw_to_article).transpose()
    }

    /// Find an article by law (full or short name) and article number
    pub(crate) fn find(&self, law: &str, article_number: &str) -> Result<Option<LawArticle>, StoreError> {
        use rusqlite::OptionalExtension;

        let row = self
            .conn
            .query_row(
                "SELECT id, law_name, short_name, article_number, title, content, keywords
                 FROM law_articles
                 WHERE (law_name = ?1 OR short_name = ?1) AND article_number = ?2",
                params![law, article_number],
                Self::row_to_raw,
            )
            .optional()?;
        row.map(Self::raw_to_article).transpose()
    }
}

/// Upsert one article on any connection (plain or inside a transaction)
fn upsert_row(conn: &Connection, article: &LawArticle) -> Result<i64, StoreError> {
    let keywords = serde_json::to_string(&article.keywords)?;
    conn.execute(
        "INSERT INTO law_articles (law_name, short_name, article_number, title, content, keywords)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(law_name, article_number) DO UPDATE SET
            short_name = excluded.short_name,
            title = excluded.title,
            content = excluded.content,
            keywords = excluded.keywords",
        params![
            article.law_name,
            article.short_name,
            article.article_number,
            article.title,
            article.content,
            keywords
        ],
    )?;
    let id = conn.query_row(
        "SELECT id FROM law_articles WHERE law_name = ?1 AND article_number = ?2",
        params![article.law_name, article.article_number],
        |row| row.get(0),
    )?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(number: &str, content: &str) -> LawArticle {
        LawArticle {
            id: None,
            law_name: "O'zbekiston Respublikasi Fuqarolik kodeksi".to_string(),
            short_name: "FK".to_string(),
            article_number: number.to_string(),
            title: format!("{}-modda", number),
            content: content.to_string(),
            keywords: vec!["narx".to_string()],
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let store = LawStore::new(":memory:").unwrap();
        let id = store.upsert_article(&article("356", "Shartnoma narxi")).unwrap();

        let loaded = store.get(id).unwrap().unwrap();
        assert_eq!(loaded.article_number, "356");
        assert_eq!(loaded.keywords, vec!["narx".to_string()]);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = LawStore::new(":memory:").unwrap();
        let first = store.upsert_article(&article("356", "v1")).unwrap();
        let second = store.upsert_article(&article("356", "v2")).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(first).unwrap().unwrap().content, "v2");
    }

    #[test]
    fn test_find_by_short_name() {
        let store = LawStore::new(":memory:").unwrap();
        store.upsert_article(&article("327", "Neustoyka")).unwrap();

        assert!(store.find("FK", "327").unwrap().is_some());
        assert!(store.find("FK", "999").unwrap().is_none());
    }

    #[test]
    fn test_rejects_missing_keys() {
        let store = LawStore::new(":memory:").unwrap();
        let mut bad = article("1", "x");
        bad.article_number = " ".to_string();
        assert!(matches!(store.upsert_article(&bad), Err(StoreError::InvalidData(_))));
    }
}
