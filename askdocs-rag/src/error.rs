//! Error types for the `askdocs-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in retrieval and answering operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while chunking a single document.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A document could not be read or decoded.
    #[error("Failed to load {}: {message}", path.display())]
    LoaderError {
        /// The file that failed to load.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A chat request failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An error in the pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
