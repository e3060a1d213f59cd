//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` of immutable collection snapshots protected by a
//! `tokio::sync::RwLock`. It is suitable for tests and for serving an index
//! that is rebuilt on startup.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::SearchResult;
use crate::error::Result;
use crate::vectorstore::{Collection, CollectionInfo, VectorStore, rank};

/// An in-memory vector store using cosine similarity for search.
///
/// Each collection is held as an `Arc<Collection>`. Replacing a collection
/// swaps the `Arc` under a brief write lock; searches clone the `Arc` under a
/// read lock and rank outside it, so they never observe a half-built index
/// and never block a rebuild for the duration of a scan.
///
/// # Example
///
/// ```rust,ignore
/// use askdocs_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.replace_collection("docs", collection).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn snapshot(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().await.get(name).cloned()
    }

    pub(crate) async fn insert_snapshot(&self, name: &str, collection: Arc<Collection>) {
        self.collections.write().await.insert(name.to_string(), collection);
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn replace_collection(&self, name: &str, collection: Collection) -> Result<()> {
        self.insert_snapshot(name, Arc::new(collection)).await;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().await.remove(name);
        Ok(())
    }

    async fn describe(&self, name: &str) -> Result<Option<CollectionInfo>> {
        Ok(self.snapshot(name).await.map(|collection| collection.info()))
    }

    async fn search(
        &self,
        name: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        match self.snapshot(name).await {
            Some(collection) => rank("InMemory", &collection, embedding, top_k),
            None => Ok(Vec::new()),
        }
    }
}
