//! Data types for documents, chunks, and search results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Metadata carried by a [`Document`] and inherited verbatim by its chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocumentMetadata {
    /// Human-readable label of the source, usually a relative file path.
    pub source: String,
}

impl DocumentMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }
}

/// A source document containing text content and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The text content of the document.
    pub text: String,
    /// Metadata describing where the text came from.
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document from its text and source label.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self { text: text.into(), metadata: DocumentMetadata::new(source) }
    }
}

/// A segment of a [`Document`] with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the form `{source}#{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until indexed.
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document.
    pub metadata: DocumentMetadata,
    /// Position of the chunk within its parent document.
    pub chunk_index: usize,
}

impl Chunk {
    /// Create an unembedded chunk belonging to `metadata`'s document.
    pub fn new(text: impl Into<String>, metadata: DocumentMetadata, chunk_index: usize) -> Self {
        Self {
            id: format!("{}#{chunk_index}", metadata.source),
            text: text.into(),
            embedding: Vec::new(),
            metadata,
            chunk_index,
        }
    }

    /// The source label of the parent document.
    pub fn source(&self) -> &str {
        &self.metadata.source
    }
}

/// A retrieved [`Chunk`] paired with a cosine similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A retrieved [`Chunk`] paired with its cosine distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    pub chunk: Chunk,
    /// Cosine distance (`1 - cosine similarity`), lower is closer.
    pub distance: f32,
}

/// Summary of a chunk batch, logged before indexing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentStats {
    pub total_chunks: usize,
    pub total_sources: usize,
    /// Unique source labels in sorted order.
    pub sources: Vec<String>,
}

impl DocumentStats {
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        let sources: BTreeSet<&str> = chunks.iter().map(Chunk::source).collect();
        Self {
            total_chunks: chunks.len(),
            total_sources: sources.len(),
            sources: sources.into_iter().map(str::to_string).collect(),
        }
    }
}
