use std::fs;
use std::path::Path;

use askdocs_cli::commands::{ask, index_corpus, index_status};
use askdocs_cli::{Cli, Settings};
use askdocs_rag::{NO_INFORMATION_ANSWER, UNREACHABLE_FALLBACK};
use clap::Parser;

fn settings(root: &Path, ollama_url: &str) -> Settings {
    let data = root.join("data");
    let index = root.join("vector_db");
    Cli::try_parse_from([
        "askdocs".to_string(),
        "stats".to_string(),
        format!("--data-dir={}", data.display()),
        format!("--index-dir={}", index.display()),
        "--embedder=hashing".to_string(),
        "--collection=documents".to_string(),
        "--chunk-size=200".to_string(),
        "--chunk-overlap=40".to_string(),
        format!("--ollama-base-url={ollama_url}"),
    ])
    .expect("valid arguments")
    .settings
}

async fn dead_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    drop(listener);
    format!("http://{}", addr)
}

fn write_corpus(root: &Path) {
    let data = root.join("data");
    fs::create_dir_all(data.join("admissions")).unwrap();
    fs::write(
        data.join("admissions/btech.txt"),
        "Admission to B.Tech requires 75% in 12th grade with physics and mathematics.",
    )
    .unwrap();
    fs::write(data.join("library.md"), "# Library\nThe library opens at 9am on weekdays.").unwrap();
}

#[tokio::test]
async fn index_then_stats_reports_persisted_chunks() {
    let temp = tempfile::tempdir().unwrap();
    write_corpus(temp.path());
    let settings = settings(temp.path(), "http://127.0.0.1:11434");

    let before = index_status(&settings).await.unwrap();
    assert!(!before.ready);
    assert_eq!(before.total_chunks, 0);

    let report = index_corpus(&settings).await.unwrap();
    assert_eq!(report.total_chunks, 2);
    assert!(temp.path().join("vector_db/documents.json").is_file());

    let after = index_status(&settings).await.unwrap();
    assert!(after.ready);
    assert_eq!(after.total_chunks, 2);
    assert_eq!(after.embedding_model.as_deref(), Some("hashing-v1-384"));
}

#[tokio::test]
async fn indexing_an_empty_directory_fails() {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir_all(temp.path().join("data")).unwrap();
    let settings = settings(temp.path(), "http://127.0.0.1:11434");

    assert!(index_corpus(&settings).await.is_err());
    assert!(!index_status(&settings).await.unwrap().ready);
}

#[tokio::test]
async fn ask_without_index_gives_no_information_answer() {
    let temp = tempfile::tempdir().unwrap();
    let settings = settings(temp.path(), &dead_backend().await);

    let response = ask(&settings, "What are the fees?").await.unwrap();
    assert_eq!(response.answer, NO_INFORMATION_ANSWER);
    assert!(response.sources.is_empty());
}

#[tokio::test]
async fn ask_with_backend_down_returns_fallback_and_sources() {
    let temp = tempfile::tempdir().unwrap();
    write_corpus(temp.path());
    let settings = settings(temp.path(), &dead_backend().await);
    index_corpus(&settings).await.unwrap();

    let response = ask(&settings, "What does B.Tech admission require?").await.unwrap();
    assert_eq!(response.answer, UNREACHABLE_FALLBACK);
    assert_eq!(response.sources.len(), 2);
    assert_eq!(response.sources[0].source, "data/admissions/btech.txt");
}
