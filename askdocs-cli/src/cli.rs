use std::path::PathBuf;

use askdocs_ollama::{DEFAULT_BASE_URL, DEFAULT_EMBED_DIMENSIONS, DEFAULT_EMBED_MODEL, DEFAULT_MODEL, OllamaConfig};
use askdocs_rag::{DEFAULT_COLLECTION, RagConfig};
use askdocs_telemetry::{LogFormat, TelemetryConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Ask questions about a local document collection.
///
/// Every option can also be set through the environment variable shown in
/// `--help`, or in a `.env` file in the working directory.
#[derive(Parser, Debug)]
#[command(name = "askdocs", version, about = "Ask questions about a local document collection")]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Load, chunk and embed the data directory, replacing the stored index
    Index,
    /// Serve the HTTP API until interrupted
    Serve {
        #[arg(long, env = "ASKDOCS_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "ASKDOCS_PORT", default_value_t = 8000)]
        port: u16,
    },
    /// Answer a single question and print the sources
    Ask {
        question: String,
    },
    /// Show whether an index exists and how many chunks it holds
    Stats,
}

/// How chunk and query embeddings are produced.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbedderKind {
    /// Local feature hashing, no model required
    #[default]
    Hashing,
    /// An Ollama embedding model
    Ollama,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Directory of documents to index
    #[arg(long, env = "ASKDOCS_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Directory holding the persisted index
    #[arg(long, env = "ASKDOCS_INDEX_DIR", default_value = "vector_db", global = true)]
    pub index_dir: PathBuf,

    #[arg(long, env = "ASKDOCS_COLLECTION", default_value = DEFAULT_COLLECTION, global = true)]
    pub collection: String,

    /// File containing the system prompt; the built-in prompt is used if unset or unreadable
    #[arg(long, env = "ASKDOCS_SYSTEM_PROMPT", global = true)]
    pub system_prompt: Option<PathBuf>,

    #[arg(long, env = "ASKDOCS_EMBEDDER", value_enum, default_value_t = EmbedderKind::Hashing, global = true)]
    pub embedder: EmbedderKind,

    #[arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub ollama_base_url: String,

    #[arg(long, env = "OLLAMA_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub ollama_model: String,

    #[arg(long, env = "OLLAMA_EMBED_MODEL", default_value = DEFAULT_EMBED_MODEL, global = true)]
    pub ollama_embed_model: String,

    #[arg(long, env = "OLLAMA_EMBED_DIMENSIONS", default_value_t = DEFAULT_EMBED_DIMENSIONS, global = true)]
    pub ollama_embed_dimensions: usize,

    #[arg(long, env = "OLLAMA_TEMPERATURE", default_value_t = 0.3, global = true)]
    pub ollama_temperature: f32,

    #[arg(long, env = "OLLAMA_MAX_TOKENS", default_value_t = 512, global = true)]
    pub ollama_max_tokens: u32,

    /// Chunks retrieved per question
    #[arg(long, env = "TOP_K_RESULTS", default_value_t = 3, global = true)]
    pub top_k: usize,

    #[arg(long, env = "CHUNK_SIZE", default_value_t = 1000, global = true)]
    pub chunk_size: usize,

    #[arg(long, env = "CHUNK_OVERLAP", default_value_t = 200, global = true)]
    pub chunk_overlap: usize,

    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// `pretty` or `json`
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: LogFormat,
}

impl Settings {
    pub fn rag_config(&self) -> askdocs_rag::Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .collection(&self.collection)
            .build()
    }

    pub fn ollama_config(&self) -> askdocs_ollama::Result<OllamaConfig> {
        OllamaConfig::builder()
            .base_url(&self.ollama_base_url)
            .model(&self.ollama_model)
            .temperature(self.ollama_temperature)
            .max_tokens(self.ollama_max_tokens)
            .embed_model(&self.ollama_embed_model, self.ollama_embed_dimensions)
            .build()
    }

    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig { level: self.log_level.clone(), format: self.log_format }
    }
}
