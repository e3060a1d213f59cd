//! `askdocs-server` exposes a [`RagPipeline`](askdocs_rag::RagPipeline) over
//! HTTP: a chat endpoint plus health and index statistics.

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, ServerConfig, app_router, run_server, shutdown_signal};
