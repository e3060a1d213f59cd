use std::sync::Arc;

use anyhow::{Context, bail};
use askdocs_rag::{
    BuildReport, ChatRequest, ChatResponse, DirectoryLoader, DocumentStats, RecursiveChunker,
    chunk_documents,
};
use askdocs_server::{AppState, ServerConfig, run_server};
use tracing::{error, info};

use crate::cli::{Cli, Command, Settings};
use crate::wiring::{build_pipeline, open_index};

/// Readiness summary printed by `askdocs stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatus {
    pub ready: bool,
    pub total_chunks: usize,
    pub embedding_model: Option<String>,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings;
    match cli.command {
        Command::Index => {
            let report = index_corpus(&settings).await?;
            println!("{}", report.message());
        }
        Command::Serve { host, port } => serve(&settings, ServerConfig { host, port }).await?,
        Command::Ask { question } => {
            let response = ask(&settings, &question).await?;
            print_response(&response);
        }
        Command::Stats => {
            let status = index_status(&settings).await?;
            println!("Index ready: {}", status.ready);
            println!("Total chunks: {}", status.total_chunks);
            if let Some(model) = status.embedding_model {
                println!("Embedding model: {model}");
            }
        }
    }
    Ok(())
}

/// Load, chunk and index the data directory, then check the stored count.
pub async fn index_corpus(settings: &Settings) -> anyhow::Result<BuildReport> {
    let config = settings.rag_config().context("invalid retrieval settings")?;
    info!(data_dir = %settings.data_dir.display(), "starting document indexing");

    let documents = DirectoryLoader::new(&settings.data_dir).load();
    if documents.is_empty() {
        bail!(
            "no documents found in {}; add .txt, .md or .pdf files and try again",
            settings.data_dir.display()
        );
    }

    let chunker = RecursiveChunker::from_config(&config).context("invalid chunking settings")?;
    let chunks = chunk_documents(&chunker, &documents);
    let stats = DocumentStats::from_chunks(&chunks);
    info!(
        total_chunks = stats.total_chunks,
        total_sources = stats.total_sources,
        "document statistics"
    );
    for source in &stats.sources {
        info!(source = %source, "indexed source");
    }

    let index = open_index(settings).await?;
    let report = index.build(chunks).await.context("indexing failed")?;

    let stored = index.count().await;
    if stored != report.total_chunks {
        error!(expected = report.total_chunks, stored, "index count mismatch after build");
        bail!("index verification failed: expected {} chunks, found {stored}", report.total_chunks);
    }
    info!(total_chunks = stored, elapsed_ms = report.elapsed_ms, "indexing complete");
    Ok(report)
}

pub async fn serve(settings: &Settings, server: ServerConfig) -> anyhow::Result<()> {
    let index = open_index(settings).await?;
    let pipeline = build_pipeline(settings, index)?;
    run_server(server, AppState::new(Arc::new(pipeline))).await
}

pub async fn ask(settings: &Settings, question: &str) -> anyhow::Result<ChatResponse> {
    let index = open_index(settings).await?;
    let pipeline = build_pipeline(settings, index)?;
    pipeline.respond(ChatRequest::new(question)).await.context("failed to answer question")
}

pub async fn index_status(settings: &Settings) -> anyhow::Result<IndexStatus> {
    let index = open_index(settings).await?;
    let info = index.info().await;
    Ok(IndexStatus {
        ready: index.is_ready().await,
        total_chunks: info.as_ref().map_or(0, |i| i.count),
        embedding_model: info.map(|i| i.embedding_model),
    })
}

fn print_response(response: &ChatResponse) {
    println!("{}", response.answer);
    if response.sources.is_empty() {
        return;
    }
    println!("\nSources:");
    for (i, source) in response.sources.iter().enumerate() {
        println!("  [{}] {} (relevance {:.2})", i + 1, source.source, source.relevance_score);
    }
}
