//! Builds the concrete components from [`Settings`].

use std::sync::Arc;

use anyhow::Context;
use askdocs_ollama::{OllamaClient, OllamaEmbeddingProvider};
use askdocs_rag::{
    DirectoryVectorStore, EmbeddingIndex, EmbeddingProvider, HashingEmbedder, PromptBuilder,
    RagPipeline,
};
use tracing::warn;

use crate::cli::{EmbedderKind, Settings};

pub fn build_embedder(settings: &Settings) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match settings.embedder {
        EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::default())),
        EmbedderKind::Ollama => {
            let config = settings.ollama_config().context("invalid Ollama settings")?;
            let provider =
                OllamaEmbeddingProvider::new(config).context("failed to create Ollama embedder")?;
            Ok(Arc::new(provider))
        }
    }
}

/// Open the persisted index for the configured collection.
pub async fn open_index(settings: &Settings) -> anyhow::Result<Arc<EmbeddingIndex>> {
    let config = settings.rag_config().context("invalid retrieval settings")?;
    let store = DirectoryVectorStore::open(&settings.index_dir)
        .await
        .with_context(|| format!("failed to open index at {}", settings.index_dir.display()))?;
    let embedder = build_embedder(settings)?;
    let index = EmbeddingIndex::new(config.collection, embedder, Arc::new(store))
        .context("failed to create embedding index")?;

    if let Some(stored) = index.model_mismatch().await {
        warn!(
            stored = %stored,
            configured = %index.embedder().model_id(),
            "index was built with a different embedding model and will not be searched, re-run indexing"
        );
    }
    Ok(Arc::new(index))
}

pub fn build_pipeline(settings: &Settings, index: Arc<EmbeddingIndex>) -> anyhow::Result<RagPipeline> {
    let config = settings.rag_config().context("invalid retrieval settings")?;
    let ollama = settings.ollama_config().context("invalid Ollama settings")?;
    let generator = OllamaClient::new(ollama).context("failed to create Ollama client")?;
    let prompt = settings.system_prompt.as_ref().map(PromptBuilder::from_file).unwrap_or_default();

    RagPipeline::builder()
        .config(config)
        .index(index)
        .generator(Arc::new(generator))
        .prompt(prompt)
        .build()
        .context("failed to build pipeline")
}
