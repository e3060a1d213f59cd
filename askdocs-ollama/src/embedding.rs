//! Embeddings from Ollama's `/api/embeddings` endpoint.

use askdocs_rag::{EmbeddingProvider, RagError, l2_normalize};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OllamaConfig;
use crate::error::Result;

const PROVIDER: &str = "ollama";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embedding provider backed by a local Ollama embedding model.
///
/// Vectors are L2-normalised before being returned. Unlike
/// [`HashingEmbedder`](askdocs_rag::HashingEmbedder) they may contain
/// negative components, so cosine distance can exceed 1 and relevance
/// scores are clamped.
pub struct OllamaEmbeddingProvider {
    http: reqwest::Client,
    config: OllamaConfig,
    model_id: String,
}

impl OllamaEmbeddingProvider {
    /// # Errors
    ///
    /// Returns [`OllamaError::Client`](crate::OllamaError::Client) if the
    /// HTTP client cannot be constructed.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let model_id = format!("ollama/{}", config.embed_model);
        Ok(Self { http, config, model_id })
    }
}

fn embedding_error(message: impl Into<String>) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.to_string(), message: message.into() }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> askdocs_rag::Result<Vec<f32>> {
        let response = self
            .http
            .post(self.config.endpoint("/api/embeddings"))
            .timeout(self.config.embed_timeout)
            .json(&EmbeddingRequest { model: &self.config.embed_model, prompt: text })
            .send()
            .await
            .map_err(|e| embedding_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(embedding_error(format!("status {}: {body}", status.as_u16())));
        }

        let EmbeddingResponse { mut embedding } =
            response.json().await.map_err(|e| embedding_error(e.to_string()))?;
        if embedding.len() != self.config.embed_dimensions {
            return Err(embedding_error(format!(
                "expected {} dimensions from '{}', got {}",
                self.config.embed_dimensions,
                self.config.embed_model,
                embedding.len()
            )));
        }

        l2_normalize(&mut embedding);
        debug!(model = %self.config.embed_model, "embedded text");
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.config.embed_dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
