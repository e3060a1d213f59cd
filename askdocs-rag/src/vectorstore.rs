//! Vector store trait for storing and searching vector embeddings.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// An immutable set of embedded chunks that replaces a collection wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Length of every embedding in the collection.
    pub dimensions: usize,
    /// The [`EmbeddingProvider::model_id`](crate::EmbeddingProvider::model_id) used at build time.
    pub embedding_model: String,
    pub built_at: DateTime<Utc>,
    pub chunks: Vec<Chunk>,
}

impl Collection {
    /// Bundle embedded chunks into a collection.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if `chunks` is empty, or if any
    /// chunk is missing its embedding or has a different dimensionality.
    pub fn new(chunks: Vec<Chunk>, embedding_model: impl Into<String>) -> Result<Self> {
        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);
        if dimensions == 0 {
            return Err(RagError::VectorStoreError {
                backend: "collection".to_string(),
                message: "a collection needs at least one embedded chunk".to_string(),
            });
        }
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(RagError::VectorStoreError {
                backend: "collection".to_string(),
                message: format!(
                    "chunk '{}' has {} dimensions, expected {dimensions}",
                    bad.id,
                    bad.embedding.len()
                ),
            });
        }
        Ok(Self { dimensions, embedding_model: embedding_model.into(), built_at: Utc::now(), chunks })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn info(&self) -> CollectionInfo {
        CollectionInfo {
            count: self.chunks.len(),
            dimensions: self.dimensions,
            embedding_model: self.embedding_model.clone(),
            built_at: self.built_at,
        }
    }
}

/// Summary of a stored collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionInfo {
    pub count: usize,
    pub dimensions: usize,
    pub embedding_model: String,
    pub built_at: DateTime<Utc>,
}

/// A storage backend for vector embeddings with similarity search.
///
/// Collections are replaced wholesale: readers observe either the previous
/// collection or the new one, never a partially written mix.
///
/// # Example
///
/// ```rust,ignore
/// use askdocs_rag::{Collection, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.replace_collection("docs", Collection::new(chunks, "hashing-v1-384")?).await?;
/// let results = store.search("docs", &query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Atomically replace (or create) a named collection.
    async fn replace_collection(&self, name: &str, collection: Collection) -> Result<()>;

    /// Delete a named collection and all its data. No-op if it does not exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Describe a collection, or `None` if it has never been built.
    async fn describe(&self, name: &str) -> Result<Option<CollectionInfo>>;

    /// Number of entries in a collection; zero if it does not exist.
    async fn count(&self, name: &str) -> Result<usize> {
        Ok(self.describe(name).await?.map_or(0, |info| info.count))
    }

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending cosine similarity. A missing
    /// collection yields an empty result.
    async fn search(
        &self,
        name: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Brute-force ranking of a collection against a query vector.
pub(crate) fn rank(
    backend: &str,
    collection: &Collection,
    embedding: &[f32],
    top_k: usize,
) -> Result<Vec<SearchResult>> {
    if embedding.len() != collection.dimensions {
        return Err(RagError::VectorStoreError {
            backend: backend.to_string(),
            message: format!(
                "query has {} dimensions but the collection was built with {} ({})",
                embedding.len(),
                collection.dimensions,
                collection.embedding_model
            ),
        });
    }

    let mut scored: Vec<SearchResult> = collection
        .chunks
        .iter()
        .map(|chunk| SearchResult {
            chunk: chunk.clone(),
            score: cosine_similarity(&chunk.embedding, embedding),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    Ok(scored)
}
