//! End-to-end tests of the question-answering pipeline with a stub generator.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use askdocs_rag::{
    ChatRequest, Chunk, Document, DocumentMetadata, EmbeddingIndex, Generator, HashingEmbedder,
    InMemoryVectorStore, NO_INFORMATION_ANSWER, RagConfig, RagError, RagPipeline,
    RecursiveChunker, Retriever, TRUNCATION_MARKER, chunk_documents,
};
use async_trait::async_trait;

/// Records prompts and answers with a fixed string.
#[derive(Default)]
struct CountingGenerator {
    calls: AtomicUsize,
    last_prompt: std::sync::Mutex<Option<String>>,
}

#[async_trait]
impl Generator for CountingGenerator {
    fn name(&self) -> &str {
        "counting"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn generate(&self, prompt: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        "You need 75% in 12th grade.".to_string()
    }
}

fn empty_index() -> Arc<EmbeddingIndex> {
    Arc::new(
        EmbeddingIndex::new(
            "documents",
            Arc::new(HashingEmbedder::default()),
            Arc::new(InMemoryVectorStore::new()),
        )
        .unwrap(),
    )
}

fn pipeline(index: Arc<EmbeddingIndex>, generator: Arc<CountingGenerator>) -> RagPipeline {
    RagPipeline::builder()
        .config(RagConfig::default())
        .index(index)
        .generator(generator)
        .build()
        .unwrap()
}

#[tokio::test]
async fn single_chunk_is_retrieved_with_its_source() {
    let index = empty_index();
    let chunk = Chunk::new(
        "Admission requires 75% in 12th grade.",
        DocumentMetadata::new("admissions.txt"),
        0,
    );
    let report = index.build(vec![chunk]).await.unwrap();
    assert_eq!(report.total_chunks, 1);

    let ctx = Retriever::new(index).get_context("What are admission requirements?", 3).await.unwrap();
    assert!(ctx.context.contains("Admission requires 75% in 12th grade."));
    assert_eq!(ctx.sources.len(), 1);
    assert_eq!(ctx.sources[0].source, "admissions.txt");
    assert!((0.0..=1.0).contains(&ctx.sources[0].relevance_score));
}

#[tokio::test]
async fn empty_index_answers_without_calling_generator() {
    let generator = Arc::new(CountingGenerator::default());
    let pipeline = pipeline(empty_index(), generator.clone());

    let response = pipeline.answer("anything").await.unwrap();
    assert_eq!(response.answer, NO_INFORMATION_ANSWER);
    assert!(response.sources.is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn answer_uses_context_and_truncates_sources() {
    let index = empty_index();
    let long_text = format!("Admission requires 75% in 12th grade. {}", "x".repeat(480));
    index
        .build(vec![Chunk::new(long_text, DocumentMetadata::new("data/admissions.txt"), 0)])
        .await
        .unwrap();

    let generator = Arc::new(CountingGenerator::default());
    let pipeline = pipeline(index, generator.clone());
    let response = pipeline.answer("What are admission requirements?").await.unwrap();

    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.answer, "You need 75% in 12th grade.");
    assert_eq!(response.sources.len(), 1);
    let content = &response.sources[0].content;
    assert_eq!(content.chars().count(), 300 + TRUNCATION_MARKER.chars().count());
    assert!(content.ends_with(TRUNCATION_MARKER));

    let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("[Source 1: data/admissions.txt]"));
    assert!(prompt.contains("USER QUESTION: What are admission requirements?"));
}

#[tokio::test]
async fn respond_validates_and_echoes_conversation_id() {
    let generator = Arc::new(CountingGenerator::default());
    let pipeline = pipeline(empty_index(), generator);

    let response = pipeline
        .respond(ChatRequest::new("What are the fees?").with_conversation_id("conv_7"))
        .await
        .unwrap();
    assert_eq!(response.conversation_id.as_deref(), Some("conv_7"));

    let err = pipeline.respond(ChatRequest::new("")).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidRequest(_)));
}

#[tokio::test]
async fn reindexing_chunked_documents_replaces_corpus() {
    let index = empty_index();
    let chunker = RecursiveChunker::new(200, 20).unwrap();

    let first = chunk_documents(&chunker, &[Document::new("Library opens at 9am.", "library.txt")]);
    index.build(first).await.unwrap();
    let second = chunk_documents(&chunker, &[Document::new("Fees are due in August.", "fees.txt")]);
    index.build(second).await.unwrap();

    assert_eq!(index.count().await, 1);
    let neighbors = index.query("library hours", 5).await.unwrap();
    assert!(neighbors.iter().all(|n| n.chunk.source() == "fees.txt"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queries_during_rebuild_see_a_whole_collection() {
    let index = empty_index();
    let old = (0..50)
        .map(|i| Chunk::new(format!("old chunk {i}"), DocumentMetadata::new("old.txt"), i))
        .collect::<Vec<_>>();
    index.build(old).await.unwrap();

    let new = (0..80)
        .map(|i| Chunk::new(format!("new chunk {i}"), DocumentMetadata::new("new.txt"), i))
        .collect::<Vec<_>>();

    let builder = {
        let index = index.clone();
        tokio::spawn(async move { index.build(new).await })
    };

    for _ in 0..50 {
        let neighbors = index.query("chunk", 100).await.unwrap();
        let first = neighbors[0].chunk.source().to_string();
        assert!(neighbors.iter().all(|n| n.chunk.source() == first));
        assert!(neighbors.len() == 50 || neighbors.len() == 80);
        tokio::task::yield_now().await;
    }

    builder.await.unwrap().unwrap();
    assert_eq!(index.count().await, 80);
}
