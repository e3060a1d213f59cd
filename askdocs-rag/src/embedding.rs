//! Embedding provider trait and the built-in deterministic embedder.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations must be deterministic for a given [`model_id`](EmbeddingProvider::model_id):
/// the same text always produces the same vector. Vectors are expected to be
/// L2-normalised so that cosine distance is comparable across queries.
///
/// The default [`embed_batch`](EmbeddingProvider::embed_batch) implementation
/// calls [`embed`](EmbeddingProvider::embed) sequentially; backends that support
/// native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use askdocs_rag::{EmbeddingProvider, HashingEmbedder};
///
/// let provider = HashingEmbedder::default();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Identifier of the model and version that produced the vectors.
    fn model_id(&self) -> &str;
}

/// Scale `vector` to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Default bucket count, matching the width of small sentence-embedding models.
pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

/// Deterministic bag-of-words embedder using feature hashing.
///
/// Each lower-cased alphanumeric token is hashed with SHA-256 into one of
/// `dimensions` buckets; the term-frequency vector is then L2-normalised.
/// The output depends only on the input text, never on process state, so
/// vectors persisted by one run are valid in the next.
///
/// All components are non-negative, which keeps cosine distance in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self { dimensions, model_id: format!("hashing-v1-{dimensions}") }
    }

    /// Synchronous embedding used by the async trait methods.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            vector[self.bucket(&token)] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dimensions as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSIONS)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
