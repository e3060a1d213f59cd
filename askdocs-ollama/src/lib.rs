//! # askdocs-ollama
//!
//! Ollama backends for askdocs.
//!
//! - [`OllamaClient`] implements [`Generator`](askdocs_rag::Generator) over
//!   `/api/generate`, with a `/api/tags` health probe
//! - [`OllamaEmbeddingProvider`] implements
//!   [`EmbeddingProvider`](askdocs_rag::EmbeddingProvider) over `/api/embeddings`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use askdocs_ollama::{OllamaClient, OllamaConfig};
//!
//! let client = OllamaClient::new(OllamaConfig::builder().model("llama3.2:1b").build()?)?;
//! if client.health_check().await {
//!     let answer = client.generate("Why is the sky blue?").await;
//! }
//! ```

mod client;
mod config;
mod embedding;
mod error;

pub use client::OllamaClient;
pub use config::{
    DEFAULT_BASE_URL, DEFAULT_EMBED_DIMENSIONS, DEFAULT_EMBED_MODEL, DEFAULT_MODEL, OllamaConfig,
    OllamaConfigBuilder,
};
pub use embedding::OllamaEmbeddingProvider;
pub use error::{OllamaError, Result};
