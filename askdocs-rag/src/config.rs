//! Configuration for chunking, retrieval and answer shaping.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default collection name used when none is configured.
pub const DEFAULT_COLLECTION: &str = "documents";

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Maximum number of characters of each source echoed back in a response.
    pub max_source_chars: usize,
    /// Name of the logical collection the index reads and replaces.
    pub collection: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            max_source_chars: 300,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the display limit for source excerpts.
    pub fn max_source_chars(mut self, max: usize) -> Self {
        self.config.max_source_chars = max;
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `max_source_chars == 0`
    /// - the collection name is empty or contains path separators
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if config.max_source_chars == 0 {
            return Err(RagError::ConfigError(
                "max_source_chars must be greater than zero".to_string(),
            ));
        }
        validate_collection_name(&config.collection)?;
        Ok(config)
    }
}

/// Collection names double as file stems for the directory-backed store.
pub(crate) fn validate_collection_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(RagError::ConfigError(format!("invalid collection name '{name}'")))
    }
}
