//! Turns a question into a context string and a ranked list of sources.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Neighbor;
use crate::error::Result;
use crate::index::EmbeddingIndex;

/// Delimiter placed between context entries.
pub const CONTEXT_DELIMITER: &str = "\n---\n";

/// A retrieved passage as reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// The chunk text.
    pub content: String,
    /// Source label of the parent document.
    pub source: String,
    /// `1 - distance`, clamped to `[0, 1]`. Not a calibrated probability.
    pub relevance_score: f32,
}

/// Result of [`Retriever::get_context`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub context: String,
    pub sources: Vec<Source>,
}

impl RetrievedContext {
    /// `true` when nothing was retrieved and no answer is possible.
    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }
}

/// Convert a cosine distance into a relevance score.
///
/// Cosine distance lies in `[0, 2]` in general and in `[0, 1]` for
/// non-negative embeddings; the clamp keeps the score in `[0, 1]` for any
/// embedder.
pub fn relevance_from_distance(distance: f32) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0)
}

/// Retrieves the chunks closest to a query and formats them as prompt context.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
}

impl Retriever {
    pub fn new(index: Arc<EmbeddingIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }

    /// Retrieve the `k` nearest chunks for `query`.
    ///
    /// Each entry of the context reads `[Source i: label]\ntext\n`; entries are
    /// joined by [`CONTEXT_DELIMITER`] in relevance order. An empty index
    /// yields an empty context and no sources.
    ///
    /// # Errors
    ///
    /// Propagates embedding or search failures from the index.
    pub async fn get_context(&self, query: &str, k: usize) -> Result<RetrievedContext> {
        let neighbors = self.index.query(query, k).await?;
        if neighbors.is_empty() {
            debug!("no chunks retrieved");
            return Ok(RetrievedContext::default());
        }
        Ok(assemble(neighbors))
    }
}

fn assemble(neighbors: Vec<Neighbor>) -> RetrievedContext {
    let mut parts = Vec::with_capacity(neighbors.len());
    let mut sources = Vec::with_capacity(neighbors.len());

    for (i, neighbor) in neighbors.into_iter().enumerate() {
        let label = neighbor.chunk.metadata.source;
        parts.push(format!("[Source {}: {label}]\n{}\n", i + 1, neighbor.chunk.text));
        sources.push(Source {
            content: neighbor.chunk.text,
            source: label,
            relevance_score: relevance_from_distance(neighbor.distance),
        });
    }

    RetrievedContext { context: parts.join(CONTEXT_DELIMITER), sources }
}
