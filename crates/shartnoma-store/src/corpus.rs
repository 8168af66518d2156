//! In-memory retrieval corpus built from the article table

use crate::embedding::EmbeddingModel;
use crate::vector_index::VectorIndex;
use crate::{LawArticle, LawStore, StoreError};
use async_trait::async_trait;
use shartnoma_domain::traits::{CollaboratorError, PassageRetriever, RetrievedPassage};
use shartnoma_domain::LawCitation;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Search quality parameter used for every query
const EF_SEARCH: usize = 64;

/// Articles plus their HNSW index
///
/// Holds no database connection, so it can be shared across tasks behind an `Arc`.
pub struct LawCorpus {
    articles: HashMap<i64, LawArticle>,
    index: VectorIndex,
    model: Box<dyn EmbeddingModel>,
}

impl LawCorpus {
    /// Load every article from the store and index it
    pub fn build<M>(store: &LawStore, model: M) -> Result<Self, StoreError>
    where
        M: EmbeddingModel + 'static,
    {
        Self::from_articles(store.all_articles()?, model)
    }

    /// Index an explicit list of articles
    ///
    /// Articles without an id are numbered after the highest existing id.
    pub fn from_articles<M>(articles: Vec<LawArticle>, model: M) -> Result<Self, StoreError>
    where
        M: EmbeddingModel + 'static,
    {
        let index = VectorIndex::with_capacity(model.dimension(), articles.len());
        let mut next_id = articles.iter().filter_map(|a| a.id).max().unwrap_or(0) + 1;
        let mut by_id = HashMap::with_capacity(articles.len());

        for mut article in articles {
            let id = match article.id {
                Some(id) => id,
                None => {
                    let id = next_id;
                    next_id += 1;
                    article.id = Some(id);
                    id
                }
            };
            match model.embed(&article.embedding_text()) {
                Ok(embedding) => {
                    index
                        .add(id, &embedding)
                        .map_err(|e| StoreError::Index(e.to_string()))?;
                    by_id.insert(id, article);
                }
                Err(e) => {
                    warn!("Skipping article {} of '{}': {}", article.article_number, article.law_name, e);
                }
            }
        }

        info!("Indexed {} law articles", by_id.len());
        Ok(Self {
            articles: by_id,
            index,
            model: Box::new(model),
        })
    }

    /// Number of indexed articles
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Whether the corpus has no articles
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Look up an article by id
    pub fn article(&self, id: i64) -> Option<&LawArticle> {
        self.articles.get(&id)
    }

    /// Synchronous similarity search
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedPassage>, StoreError> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self
            .model
            .embed(query)
            .map_err(|e| StoreError::Index(e.to_string()))?;
        let hits = self
            .index
            .search(&embedding, top_k, EF_SEARCH)
            .map_err(|e| StoreError::Index(e.to_string()))?;

        let passages: Vec<RetrievedPassage> = hits
            .into_iter()
            .filter_map(|(id, similarity)| {
                self.articles.get(&id).map(|article| RetrievedPassage {
                    citation: LawCitation::new(&article.law_name, &article.article_number),
                    title: article.title.clone(),
                    content: article.content.clone(),
                    similarity,
                })
            })
            .take(top_k)
            .collect();

        debug!("Retrieved {} passages for query of {} chars", passages.len(), query.len());
        Ok(passages)
    }
}

#[async_trait]
impl PassageRetriever for LawCorpus {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedPassage>, CollaboratorError> {
        self.search(query, top_k).map_err(|e| match e {
            StoreError::Index(msg) => CollaboratorError::InvalidResponse(msg),
            other => CollaboratorError::Failed(other.to_string()),
        })
    }
}
