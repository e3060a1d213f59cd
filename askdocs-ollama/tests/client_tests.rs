use std::time::{Duration, Instant};

use askdocs_ollama::{OllamaClient, OllamaConfig, OllamaEmbeddingProvider};
use askdocs_rag::{EmbeddingProvider, GenerationError, Generator, TIMEOUT_FALLBACK, UNREACHABLE_FALLBACK};
use axum::{Json, Router, http::StatusCode, routing::get, routing::post};
use serde_json::{Value, json};

async fn spawn_backend(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

/// A base URL with nothing listening behind it.
async fn dead_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    drop(listener);
    format!("http://{}", addr)
}

fn client(base_url: &str) -> OllamaClient {
    let config = OllamaConfig::builder()
        .base_url(base_url)
        .health_timeout(Duration::from_millis(500))
        .generate_timeout(Duration::from_millis(300))
        .build()
        .expect("valid config");
    OllamaClient::new(config).expect("client")
}

#[tokio::test]
async fn health_check_against_unreachable_backend_is_false() {
    let client = client(&dead_backend().await);

    let started = Instant::now();
    assert!(!client.health_check().await);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn health_check_against_hanging_backend_times_out_false() {
    let app = Router::new().route(
        "/api/tags",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "models": [] }))
        }),
    );
    let (base, handle) = spawn_backend(app).await;
    let config = OllamaConfig::builder()
        .base_url(&base)
        .health_timeout(Duration::from_millis(300))
        .build()
        .expect("valid config");
    let client = OllamaClient::new(config).expect("client");

    let started = Instant::now();
    assert!(!client.health_check().await);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(250), "returned before the timeout: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "health check overran its timeout: {elapsed:?}");
    handle.abort();
}

#[tokio::test]
async fn health_check_against_running_backend_is_true() {
    let app = Router::new().route("/api/tags", get(|| async { Json(json!({ "models": [] })) }));
    let (base, handle) = spawn_backend(app).await;

    assert!(client(&base).health_check().await);
    handle.abort();
}

#[tokio::test]
async fn generate_sends_options_and_trims_response() {
    let app = Router::new().route(
        "/api/generate",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["model"], "llama3.2:1b");
            assert_eq!(body["stream"], false);
            assert_eq!(body["options"]["num_predict"], 512);
            assert!(body["prompt"].as_str().unwrap().contains("USER QUESTION"));
            Json(json!({ "response": "  Tuition is due in August.\n", "done": true }))
        }),
    );
    let (base, handle) = spawn_backend(app).await;

    let answer = client(&base).generate("USER QUESTION: when are fees due?").await;
    assert_eq!(answer, "Tuition is due in August.");
    handle.abort();
}

#[tokio::test]
async fn slow_backend_yields_timeout_fallback() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "response": "too late" }))
        }),
    );
    let (base, handle) = spawn_backend(app).await;
    let client = client(&base);

    assert_eq!(client.try_generate("q").await, Err(GenerationError::Timeout));
    let answer = client.generate("q").await;
    assert_eq!(answer, TIMEOUT_FALLBACK);
    assert_ne!(answer, UNREACHABLE_FALLBACK);
    handle.abort();
}

#[tokio::test]
async fn unreachable_backend_yields_connection_fallback() {
    let client = client(&dead_backend().await);

    assert!(matches!(client.try_generate("q").await, Err(GenerationError::Unreachable(_))));
    assert_eq!(client.generate("q").await, UNREACHABLE_FALLBACK);
}

#[tokio::test]
async fn error_status_is_reported_in_answer() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::NOT_FOUND, "model 'llama3.2:1b' not found") }),
    );
    let (base, handle) = spawn_backend(app).await;
    let client = client(&base);

    assert_eq!(
        client.try_generate("q").await,
        Err(GenerationError::Backend {
            status: 404,
            message: "model 'llama3.2:1b' not found".to_string()
        })
    );
    assert!(client.generate("q").await.starts_with("Error generating response:"));
    handle.abort();
}

#[tokio::test]
async fn embeddings_are_normalised() {
    let app = Router::new().route(
        "/api/embeddings",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["model"], "nomic-embed-text");
            Json(json!({ "embedding": [3.0, 4.0, 0.0] }))
        }),
    );
    let (base, handle) = spawn_backend(app).await;

    let config = OllamaConfig::builder()
        .base_url(&base)
        .embed_model("nomic-embed-text", 3)
        .build()
        .unwrap();
    let provider = OllamaEmbeddingProvider::new(config).unwrap();

    let embedding = provider.embed("hello").await.unwrap();
    assert_eq!(embedding, vec![0.6, 0.8, 0.0]);
    assert_eq!(provider.dimensions(), 3);
    assert_eq!(provider.model_id(), "ollama/nomic-embed-text");
    handle.abort();
}

#[tokio::test]
async fn embedding_dimension_mismatch_is_an_error() {
    let app = Router::new()
        .route("/api/embeddings", post(|| async { Json(json!({ "embedding": [1.0, 0.0] })) }));
    let (base, handle) = spawn_backend(app).await;

    let config = OllamaConfig::builder().base_url(&base).embed_model("tiny", 3).build().unwrap();
    let provider = OllamaEmbeddingProvider::new(config).unwrap();

    assert!(provider.embed("hello").await.is_err());
    handle.abort();
}
