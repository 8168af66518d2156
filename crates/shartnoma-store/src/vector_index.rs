//! HNSW Vector Index for Article Retrieval
//!
//! Wrapper around the HNSW algorithm for nearest-neighbor search over article
//! embeddings.
//!
//! # Architecture
//!
//! - In-memory index, rebuilt from SQLite whenever the corpus is loaded
//! - Keyed by the article's SQLite row id
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//! - **efConstruction**: Candidate list size during construction (default: 200)
//! - **efSearch**: Candidate list size during search, passed per query

use hnsw_rs::prelude::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Internal HNSW error
    #[error("HNSW error: {0}")]
    Internal(String),
}

struct IndexState {
    hnsw: Hnsw<'static, f32, DistCosine>,
    id_map: HashMap<usize, i64>,
    next_id: usize,
}

/// HNSW index of (article id, embedding) pairs
///
/// # Examples
///
/// ```no_run
/// use shartnoma_store::vector_index::VectorIndex;
///
/// let index = VectorIndex::new(384);
/// let embedding = vec![0.1; 384];
/// index.add(42, &embedding).unwrap();
///
/// let results = index.search(&embedding, 5, 64).unwrap();
/// assert_eq!(results[0].0, 42);
/// ```
pub struct VectorIndex {
    dimension: usize,
    max_elements: usize,
    state: Mutex<IndexState>,
}

fn new_hnsw(max_elements: usize) -> Hnsw<'static, f32, DistCosine> {
    let nb_layer = 16.min((max_elements as f32).ln().trunc() as usize).max(1);
    Hnsw::<'static, f32, DistCosine>::new(
        DEFAULT_M,
        max_elements,
        nb_layer,
        DEFAULT_EF_CONSTRUCTION,
        DistCosine {},
    )
}

impl VectorIndex {
    /// Create a new vector index with the specified dimension
    pub fn new(dimension: usize) -> Self {
        Self::with_capacity(dimension, DEFAULT_MAX_ELEMENTS)
    }

    /// Create an index sized for `max_elements` vectors
    pub fn with_capacity(dimension: usize, max_elements: usize) -> Self {
        let max_elements = max_elements.max(16);
        Self {
            dimension,
            max_elements,
            state: Mutex::new(IndexState {
                hnsw: new_hnsw(max_elements),
                id_map: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexState>, VectorIndexError> {
        self.state
            .lock()
            .map_err(|e| VectorIndexError::Internal(format!("Index lock poisoned: {}", e)))
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Add an article embedding to the index
    pub fn add(&self, article_id: i64, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;

        let mut state = self.lock()?;
        let internal_id = state.next_id;
        state.next_id += 1;
        state.id_map.insert(internal_id, article_id);

        let embedding_vec = embedding.to_vec();
        state.hnsw.insert((&embedding_vec, internal_id));
        Ok(())
    }

    /// Search for the k nearest articles
    ///
    /// Returns (article id, similarity) pairs, most similar first.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(i64, f32)>, VectorIndexError> {
        self.check_dimension(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let state = self.lock()?;
        if state.id_map.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<(i64, f32)> = state
            .hnsw
            .search(query, k, ef_search.max(k))
            .into_iter()
            .filter_map(|neighbour| {
                state
                    .id_map
                    .get(&neighbour.d_id)
                    .map(|&article_id| (article_id, 1.0 - neighbour.distance))
            })
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(results)
    }

    /// Number of vectors in the index
    pub fn len(&self) -> usize {
        self.lock().map(|state| state.id_map.len()).unwrap_or(0)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every vector
    pub fn clear(&self) -> Result<(), VectorIndexError> {
        let mut state = self.lock()?;
        state.hnsw = new_hnsw(self.max_elements);
        state.id_map.clear();
        state.next_id = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_index_creation() {
        let index = VectorIndex::new(384);
        assert_eq!(index.dimension, 384);
        assert!(index.is_empty());
    }

    #[test]
    fn test_add_and_search() {
        let index = VectorIndex::new(384);

        let embedding1: Vec<f32> = (0..384).map(|i| (i as f32) / 384.0).collect();
        index.add(1, &embedding1).unwrap();

        let mut embedding2 = embedding1.clone();
        embedding2[0] = 0.5;
        index.add(2, &embedding2).unwrap();

        assert_eq!(index.len(), 2);

        let results = index.search(&embedding1, 2, 64).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert!(results[0].1 > 0.99);
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = VectorIndex::new(384);
        let result = index.add(1, &[0.1; 128]);
        assert!(matches!(result, Err(VectorIndexError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::new(3);
        assert!(index.search(&[1.0, 0.0, 0.0], 5, 64).unwrap().is_empty());
    }

    #[test]
    fn test_clear() {
        let index = VectorIndex::new(3);
        index.add(7, &[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(index.len(), 1);

        index.clear().unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_cosine_ordering() {
        let index = VectorIndex::new(3);
        index.add(1, &[1.0, 0.0, 0.0]).unwrap();
        index.add(2, &[0.0, 1.0, 0.0]).unwrap();
        index.add(3, &[0.7071, 0.7071, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 3, 64).unwrap();

        assert_eq!(results[0].0, 1);
        assert!(results[0].1 > 0.99);
        assert_eq!(results[1].0, 3);
        assert!(results[1].1 > 0.5);
        assert_eq!(results[2].0, 2);
        assert!(results[2].1 < 0.1);
    }
}
