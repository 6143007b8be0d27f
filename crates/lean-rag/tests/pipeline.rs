//! End-to-end: extract documents, ingest the text, answer over HTTP

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use lean_rag::config::RagConfig;
use lean_rag::extraction::BatchExtractor;
use lean_rag::ingestion::{IngestOptions, IngestReport, Ingestor};
use lean_rag::providers::{HashingEmbedder, InMemoryVectorStore, LlmProvider};
use lean_rag::server::{AppState, RagServer};
use lean_rag::Result;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

/// Replies with a fixed string and keeps every prompt it was given
struct RecordingLlm {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn model(&self) -> &str {
        "recording"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

async fn post_ask(router: axum::Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_extract_ingest_ask() {
    let docs = tempdir().unwrap();
    let corpus = tempdir().unwrap();

    fs::write(
        docs.path().join("manual.md"),
        "# Wheel service\n\nTorque the **wheel nuts** to 120 Nm in a star pattern.\n",
    )
    .unwrap();
    fs::write(
        docs.path().join("notes.html"),
        "<html><head><script>var tracking = 1;</script></head>\
         <body><p>Check tyre pressure monthly.</p></body></html>",
    )
    .unwrap();

    let stats = BatchExtractor::default()
        .run(docs.path(), corpus.path(), |_| {})
        .unwrap();
    assert_eq!(stats.ok, 2);
    assert_eq!(stats.fail, 0);

    let manual = fs::read_to_string(corpus.path().join("manual.txt")).unwrap();
    assert!(manual.contains("Torque the wheel nuts to 120 Nm"));
    let notes = fs::read_to_string(corpus.path().join("notes.txt")).unwrap();
    assert!(notes.contains("Check tyre pressure monthly."));
    assert!(!notes.contains("tracking"));

    let config = RagConfig::default();
    let embedder = Arc::new(HashingEmbedder::new(128).unwrap());
    let store = Arc::new(InMemoryVectorStore::new());

    let ingestor = Ingestor::new(
        embedder.clone(),
        store.clone(),
        &config.chunking,
        &config.ingestion,
    )
    .unwrap();
    let report = ingestor
        .ingest(corpus.path(), IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(
        report,
        IngestReport {
            files: 2,
            chunks: 2,
            batches: 1
        }
    );
    assert_eq!(store.len(), 2);

    let reply = json!({
        "answer": "Torque the wheel nuts to 120 Nm.",
        "commands": [],
        "citations": [{"doc_id": "manual.txt", "page": 0}]
    });
    let llm = Arc::new(RecordingLlm {
        reply: reply.to_string(),
        prompts: Mutex::new(Vec::new()),
    });
    let state = AppState::new(config, embedder, store, llm.clone());
    let router = RagServer::with_state(state).build_router();

    let (status, body) = post_ask(router, json!({"q": "wheel nut torque?"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, reply);

    let prompts = llm.prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("[manual.txt#0] "));
    assert!(prompts[0].contains("wheel nut torque?"));
}

#[tokio::test]
async fn test_reingest_with_recreate_replaces_index() {
    let corpus = tempdir().unwrap();
    fs::write(corpus.path().join("a.txt"), "alpha beta gamma").unwrap();

    let config = RagConfig::default();
    let embedder = Arc::new(HashingEmbedder::new(32).unwrap());
    let store = Arc::new(InMemoryVectorStore::new());
    let ingestor = Ingestor::new(embedder, store.clone(), &config.chunking, &config.ingestion)
        .unwrap();

    ingestor
        .ingest(corpus.path(), IngestOptions::default())
        .await
        .unwrap();
    fs::write(corpus.path().join("b.txt"), "delta epsilon").unwrap();
    ingestor
        .ingest(corpus.path(), IngestOptions { recreate: true })
        .await
        .unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.payload(1).unwrap().doc_id, "b.txt");
}
