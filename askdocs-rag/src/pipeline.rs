//! Question-answering pipeline orchestrator.
//!
//! The [`RagPipeline`] sequences retrieval, prompt construction, generation
//! and response shaping by composing a [`Retriever`], a [`PromptBuilder`]
//! and a [`Generator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use askdocs_rag::{RagPipeline, RagConfig};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .index(index)
//!     .generator(Arc::new(ollama))
//!     .build()?;
//!
//! let response = pipeline.answer("What are the admission requirements?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chat::{ChatRequest, ChatResponse};
use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::generator::Generator;
use crate::index::EmbeddingIndex;
use crate::prompt::PromptBuilder;
use crate::retriever::{Retriever, Source};

/// Answer returned without calling the generator when nothing relevant is indexed.
pub const NO_INFORMATION_ANSWER: &str = "I couldn't find any relevant information in the indexed \
     documents to answer your question. Please try rephrasing or ask about topics covered in \
     the documentation.";

/// Appended to source excerpts that were cut short.
pub const TRUNCATION_MARKER: &str = "...";

/// Cut `content` to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was removed.
pub fn truncate_source(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{TRUNCATION_MARKER}", &content[..byte_idx]),
        None => content.to_string(),
    }
}

/// The question-answering orchestrator.
///
/// Each call is independent: retrieve → short-circuit if nothing was found →
/// build prompt → generate → truncate sources. There are no retries; a failed
/// generation surfaces its fallback text as the answer. Construct one via
/// [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    prompt: PromptBuilder,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        self.retriever.index()
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    /// Answer a question from the indexed documents.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] only for unexpected failures such
    /// as the embedding backend rejecting the query. An empty index and a
    /// failed generation both produce an `Ok` response.
    pub async fn answer(&self, question: &str) -> Result<ChatResponse> {
        let preview: String = question.chars().take(100).collect();
        info!(question = %preview, "processing question");

        let retrieved =
            self.retriever.get_context(question, self.config.top_k).await.map_err(|e| {
                error!(error = %e, "retrieval failed");
                RagError::PipelineError(format!("retrieval failed: {e}"))
            })?;

        if retrieved.is_empty() {
            info!("no relevant context found, skipping generation");
            return Ok(ChatResponse {
                answer: NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
                conversation_id: None,
            });
        }

        let prompt = self.prompt.build(question, &retrieved.context);
        let answer = self.generator.generate(&prompt).await;

        let max_chars = self.config.max_source_chars;
        let sources = retrieved
            .sources
            .into_iter()
            .map(|source| Source { content: truncate_source(&source.content, max_chars), ..source })
            .collect::<Vec<_>>();

        info!(source_count = sources.len(), answer_len = answer.len(), "question answered");
        Ok(ChatResponse { answer, sources, conversation_id: None })
    }

    /// Validate a [`ChatRequest`], answer it, and echo its conversation id.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidRequest`] if validation fails, otherwise
    /// the errors of [`answer`](Self::answer).
    pub async fn respond(&self, request: ChatRequest) -> Result<ChatResponse> {
        request.validate()?;
        let mut response = self.answer(&request.question).await?;
        response.conversation_id = request.conversation_id;
        Ok(response)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `index` and `generator` are required; the prompt defaults to
/// [`PromptBuilder::default`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    index: Option<Arc<EmbeddingIndex>>,
    generator: Option<Arc<dyn Generator>>,
    prompt: Option<PromptBuilder>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding index to retrieve from.
    pub fn index(mut self, index: Arc<EmbeddingIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the generation backend.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the system instructions.
    pub fn prompt(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let index =
            self.index.ok_or_else(|| RagError::ConfigError("index is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;

        Ok(RagPipeline {
            config,
            retriever: Retriever::new(index),
            generator,
            prompt: self.prompt.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_source_is_cut_to_limit_plus_marker() {
        let content = "a".repeat(500);
        let truncated = truncate_source(&content, 300);
        assert_eq!(truncated.len(), 303);
        assert_eq!(&truncated[..300], &content[..300]);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn short_source_is_unchanged() {
        let exact = "b".repeat(300);
        assert_eq!(truncate_source(&exact, 300), exact);
        assert_eq!(truncate_source("short", 300), "short");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let content = "ü".repeat(10);
        assert_eq!(truncate_source(&content, 4), format!("{}...", "ü".repeat(4)));
    }

    #[test]
    fn builder_requires_index_and_generator() {
        let err = RagPipeline::builder().config(RagConfig::default()).build().err().unwrap();
        assert!(matches!(err, RagError::ConfigError(_)));
    }
}
