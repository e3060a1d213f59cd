//! # askdocs-rag
//!
//! Retrieval-augmented question answering over a local document corpus.
//!
//! ## Overview
//!
//! Documents are split into overlapping chunks, embedded, and stored in a
//! named collection. At question time the closest chunks are formatted as
//! context for a text-generation backend, and the answer is returned together
//! with the sources it was grounded on.
//!
//! - [`RecursiveChunker`] splits text on paragraph, line, sentence and word boundaries
//! - [`EmbeddingIndex`] builds and queries a collection through an
//!   [`EmbeddingProvider`] and a [`VectorStore`]
//! - [`Retriever`] turns a question into context text and [`Source`]s
//! - [`Generator`] is the seam for networked generation backends
//! - [`RagPipeline`] orchestrates a full question/answer turn
//!
//! ## Features
//!
//! - `pdf`: text extraction for `.pdf` files in [`DirectoryLoader`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use askdocs_rag::*;
//!
//! let config = RagConfig::default();
//! let index = Arc::new(EmbeddingIndex::new(
//!     &config.collection,
//!     Arc::new(HashingEmbedder::default()),
//!     Arc::new(InMemoryVectorStore::new()),
//! )?);
//!
//! let chunker = RecursiveChunker::from_config(&config)?;
//! let documents = DirectoryLoader::new("data").load();
//! index.build(chunk_documents(&chunker, &documents)).await?;
//!
//! let pipeline = RagPipeline::builder()
//!     .config(config)
//!     .index(index)
//!     .generator(generator)
//!     .build()?;
//! let response = pipeline.answer("What are the admission requirements?").await?;
//! ```

pub mod chat;
pub mod chunking;
pub mod config;
pub mod directory;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod index;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod vectorstore;

pub use chat::{ChatRequest, ChatResponse, MAX_QUESTION_CHARS};
pub use chunking::{Chunker, DEFAULT_SEPARATORS, RecursiveChunker, chunk_documents};
pub use config::{DEFAULT_COLLECTION, RagConfig, RagConfigBuilder};
pub use directory::DirectoryVectorStore;
pub use document::{Chunk, Document, DocumentMetadata, DocumentStats, Neighbor, SearchResult};
pub use embedding::{DEFAULT_HASHING_DIMENSIONS, EmbeddingProvider, HashingEmbedder, l2_normalize};
pub use error::{RagError, Result};
pub use generator::{GenerationError, Generator, TIMEOUT_FALLBACK, UNREACHABLE_FALLBACK};
pub use index::{BuildReport, EmbeddingIndex};
pub use inmemory::InMemoryVectorStore;
pub use loader::{DirectoryLoader, FileKind};
pub use pipeline::{
    NO_INFORMATION_ANSWER, RagPipeline, RagPipelineBuilder, TRUNCATION_MARKER, truncate_source,
};
pub use prompt::{DEFAULT_SYSTEM_PROMPT, PromptBuilder};
pub use retriever::{CONTEXT_DELIMITER, RetrievedContext, Retriever, Source, relevance_from_distance};
pub use vectorstore::{Collection, CollectionInfo, VectorStore};
