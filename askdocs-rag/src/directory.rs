//! Directory-backed vector store.
//!
//! Every collection is persisted as `<root>/<collection>.json`. Writes go to a
//! temporary sibling file which is then renamed over the old one, so a crash
//! mid-write leaves the previous collection intact on disk. Searches are served
//! from an in-memory snapshot loaded on [`DirectoryVectorStore::open`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::validate_collection_name;
use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorStore;
use crate::vectorstore::{Collection, CollectionInfo, VectorStore};

const FORMAT_VERSION: u32 = 1;
const EXTENSION: &str = "json";

#[derive(Serialize, Deserialize)]
struct PersistedCollection {
    format_version: u32,
    name: String,
    collection: Collection,
}

/// A [`VectorStore`] that persists collections as JSON files in a directory.
///
/// # Example
///
/// ```rust,ignore
/// use askdocs_rag::{DirectoryVectorStore, VectorStore};
///
/// let store = DirectoryVectorStore::open("vector_db").await?;
/// let ready = store.count("documents").await? > 0;
/// ```
#[derive(Debug)]
pub struct DirectoryVectorStore {
    root: PathBuf,
    cache: InMemoryVectorStore,
}

impl DirectoryVectorStore {
    /// Open (creating if needed) a store rooted at `root` and load every
    /// collection file found there. Unreadable files are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the directory cannot be created or listed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        let store = Self { root, cache: InMemoryVectorStore::new() };

        let mut entries = tokio::fs::read_dir(&store.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != EXTENSION) {
                continue;
            }
            match read_collection_file(&path).await {
                Ok(persisted) => {
                    info!(
                        collection = %persisted.name,
                        chunk_count = persisted.collection.len(),
                        "loaded persisted collection"
                    );
                    store.cache.insert_snapshot(&persisted.name, Arc::new(persisted.collection)).await;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unreadable collection file");
                }
            }
        }

        Ok(store)
    }

    /// Directory holding the collection files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{EXTENSION}"))
    }

    fn backend_error(message: impl Into<String>) -> RagError {
        RagError::VectorStoreError { backend: "Directory".to_string(), message: message.into() }
    }
}

async fn read_collection_file(path: &Path) -> Result<PersistedCollection> {
    let bytes = tokio::fs::read(path).await?;
    let persisted: PersistedCollection = serde_json::from_slice(&bytes)?;
    if persisted.format_version != FORMAT_VERSION {
        return Err(DirectoryVectorStore::backend_error(format!(
            "unsupported format version {}",
            persisted.format_version
        )));
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if persisted.name != stem {
        return Err(DirectoryVectorStore::backend_error(format!(
            "file holds collection '{}' but is named '{stem}'",
            persisted.name
        )));
    }
    Ok(persisted)
}

#[async_trait]
impl VectorStore for DirectoryVectorStore {
    async fn replace_collection(&self, name: &str, collection: Collection) -> Result<()> {
        validate_collection_name(name)?;

        let persisted =
            PersistedCollection { format_version: FORMAT_VERSION, name: name.to_string(), collection };
        let bytes = serde_json::to_vec(&persisted)?;

        let path = self.collection_path(name);
        let tmp = self.root.join(format!(".{name}.{EXTENSION}.tmp"));
        if let Err(e) = write_then_rename(&tmp, &path, &bytes).await {
            error!(collection = name, error = %e, "failed to persist collection");
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Self::backend_error(format!("failed to persist collection '{name}': {e}")));
        }
        debug!(collection = name, path = %path.display(), bytes = bytes.len(), "persisted collection");

        self.cache.insert_snapshot(name, Arc::new(persisted.collection)).await;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        match tokio::fs::remove_file(self.collection_path(name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.cache.delete_collection(name).await
    }

    async fn describe(&self, name: &str) -> Result<Option<CollectionInfo>> {
        self.cache.describe(name).await
    }

    async fn search(
        &self,
        name: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.cache.search(name, embedding, top_k).await
    }
}

async fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(tmp, bytes).await?;
    tokio::fs::rename(tmp, path).await
}
