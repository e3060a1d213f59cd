//! The embedding index: build a collection from chunks and query it by text.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::validate_collection_name;
use crate::document::{Chunk, Neighbor};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::{Collection, CollectionInfo, VectorStore};

/// Outcome of a successful [`EmbeddingIndex::build`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildReport {
    pub collection: String,
    pub total_chunks: usize,
    pub embedding_model: String,
    pub elapsed_ms: u64,
}

impl BuildReport {
    pub fn message(&self) -> String {
        format!("Successfully indexed {} document chunks", self.total_chunks)
    }
}

/// Wraps an [`EmbeddingProvider`] and a [`VectorStore`] around one named
/// collection.
///
/// `build` embeds every chunk before touching the store and then replaces the
/// collection in a single call, so a failed build leaves the previous index
/// queryable. Builds are serialised against each other; queries run
/// concurrently with each other and with a build.
pub struct EmbeddingIndex {
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    build_lock: Mutex<()>,
}

impl EmbeddingIndex {
    /// Create an index over `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the collection name is invalid.
    pub fn new(
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let collection = collection.into();
        validate_collection_name(&collection)?;
        Ok(Self { collection, embedder, store, build_lock: Mutex::new(()) })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Discard the current collection and replace it with `chunks`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if `chunks` is empty, if embedding
    /// fails, or if the store rejects the new collection. In every case the
    /// previous collection remains in place.
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<BuildReport> {
        if chunks.is_empty() {
            warn!(collection = %self.collection, "no chunks to index");
            return Err(RagError::PipelineError("no documents provided".to_string()));
        }

        let _guard = self.build_lock.lock().await;
        let started = Instant::now();
        info!(collection = %self.collection, chunk_count = chunks.len(), "indexing chunks");

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "embedding failed during build");
            RagError::PipelineError(format!("embedding failed: {e}"))
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::PipelineError(format!(
                "embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut chunks = chunks;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }
        let total_chunks = chunks.len();

        let collection = Collection::new(chunks, self.embedder.model_id())?;
        self.store.replace_collection(&self.collection, collection).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "failed to replace collection");
            RagError::PipelineError(format!(
                "failed to replace collection '{}': {e}",
                self.collection
            ))
        })?;

        let report = BuildReport {
            collection: self.collection.clone(),
            total_chunks,
            embedding_model: self.embedder.model_id().to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(collection = %self.collection, total_chunks, elapsed_ms = report.elapsed_ms, "index built");
        Ok(report)
    }

    /// Return up to `k` chunks nearest to `text`, ascending by cosine distance.
    ///
    /// An unbuilt or empty index yields an empty list, as does a collection
    /// built with a different embedding model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding the query or searching fails.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if !self.is_ready().await {
            if let Some(stored) = self.model_mismatch().await {
                warn!(
                    collection = %self.collection,
                    stored = %stored,
                    configured = %self.embedder.model_id(),
                    "collection was built with a different embedding model, skipping search"
                );
            }
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(text).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::PipelineError(format!("query embedding failed: {e}"))
        })?;

        let results = self.store.search(&self.collection, &embedding, k).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "vector store search failed");
            RagError::PipelineError(format!(
                "search failed in collection '{}': {e}",
                self.collection
            ))
        })?;

        let preview: String = text.chars().take(50).collect();
        info!(result_count = results.len(), query = %preview, "similarity search completed");

        Ok(results
            .into_iter()
            .map(|r| Neighbor { chunk: r.chunk, distance: 1.0 - r.score })
            .collect())
    }

    /// Whether a non-empty collection exists and was built with this index's
    /// embedder. Never fails.
    ///
    /// A collection embedded by a different model cannot be compared against
    /// this embedder's query vectors, so it counts as not ready until it is
    /// rebuilt.
    pub async fn is_ready(&self) -> bool {
        match self.info().await {
            Some(info) => info.count > 0 && info.embedding_model == self.embedder.model_id(),
            None => false,
        }
    }

    /// The stored collection's embedding model when it differs from this
    /// index's embedder.
    pub async fn model_mismatch(&self) -> Option<String> {
        self.info()
            .await
            .map(|info| info.embedding_model)
            .filter(|model| model != self.embedder.model_id())
    }

    /// Number of indexed chunks; zero before the first build or on store errors.
    pub async fn count(&self) -> usize {
        match self.store.count(&self.collection).await {
            Ok(count) => count,
            Err(e) => {
                warn!(collection = %self.collection, error = %e, "failed to count collection");
                0
            }
        }
    }

    /// Metadata about the current collection, if one has been built.
    pub async fn info(&self) -> Option<CollectionInfo> {
        self.store.describe(&self.collection).await.ok().flatten()
    }
}
