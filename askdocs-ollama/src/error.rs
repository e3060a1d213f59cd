//! Error types for the `askdocs-ollama` crate.

use thiserror::Error;

/// Errors raised while setting up an Ollama backend.
///
/// Request-time failures are not reported here: generation failures become
/// [`GenerationError`](askdocs_rag::GenerationError)s and embedding failures
/// become [`RagError::EmbeddingError`](askdocs_rag::RagError::EmbeddingError).
#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, OllamaError>;
