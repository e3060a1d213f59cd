//! HTTP surface: router, handlers and the serve loop.

use std::{any::Any, sync::Arc};

use anyhow::Context;
use askdocs_rag::{ChatRequest, ChatResponse, RagError, RagPipeline};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::error::ApiError;

const NOT_INDEXED: &str =
    "Vector database not initialized. Please run the indexing command first: askdocs index";
const MODEL_MISMATCH: &str = "Vector database was built with a different embedding model. \
     Please re-run indexing with the configured embedder: askdocs index";
const GENERATOR_DOWN: &str = "Ollama service is not available. Please ensure Ollama is running \
     with 'ollama serve' and the model is pulled with 'ollama pull <model>'";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        Self { pipeline }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy` when both the index and the generator are usable, else `degraded`.
    pub status: String,
    pub vector_db_initialized: bool,
    pub ollama_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub vector_db_initialized: bool,
    pub total_chunks: usize,
    pub status: String,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(AnyOrigin).allow_methods(AnyOrigin).allow_headers(AnyOrigin);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/chat", post(chat))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve until [`shutdown_signal`] resolves.
pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let index = state.pipeline.index();
    let total_chunks = index.count().await;
    if let Some(stored) = index.model_mismatch().await {
        warn!(
            collection = %index.collection(),
            stored = %stored,
            configured = %index.embedder().model_id(),
            "vector database was built with a different embedding model, re-run indexing"
        );
    } else if total_chunks > 0 {
        info!(collection = %index.collection(), total_chunks, "vector database ready");
    } else {
        warn!(collection = %index.collection(), "vector database is empty, run indexing first");
    }

    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    let addr = listener.local_addr()?;
    info!("askdocs listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

/// Resolves on ctrl-c.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "askdocs RAG API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "chat": "/chat",
            "health": "/health",
            "stats": "/stats",
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let vector_db_initialized = state.pipeline.index().is_ready().await;
    let ollama_available = state.pipeline.generator().health_check().await;
    let status = if vector_db_initialized && ollama_available { "healthy" } else { "degraded" };

    Json(HealthResponse { status: status.to_string(), vector_db_initialized, ollama_available })
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let total_chunks = state.pipeline.index().count().await;
    let vector_db_initialized = state.pipeline.index().is_ready().await;
    Json(StatsResponse {
        vector_db_initialized,
        total_chunks,
        status: if vector_db_initialized { "ready" } else { "not initialized" }.to_string(),
    })
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::unprocessable(e.body_text()))?;
    request.validate().map_err(|e| ApiError::unprocessable(e.to_string()))?;

    let index = state.pipeline.index();
    if !index.is_ready().await {
        let detail = if index.model_mismatch().await.is_some() { MODEL_MISMATCH } else { NOT_INDEXED };
        return Err(ApiError::unavailable(detail));
    }
    if !state.pipeline.generator().health_check().await {
        return Err(ApiError::unavailable(GENERATOR_DOWN));
    }

    match state.pipeline.respond(request).await {
        Ok(response) => Ok(Json(response)),
        Err(RagError::InvalidRequest(message)) => Err(ApiError::unprocessable(message)),
        Err(e) => {
            error!(error = %e, "chat request failed");
            Err(ApiError::internal(e))
        }
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unexpected failure".to_string()
    };
    error!(panic = %detail, "request handler panicked");
    ApiError::internal(detail).into_response()
}
