//! HTTP server exposing `/health` and `/ask`

pub mod routes;
pub mod state;

use axum::Router;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
pub use state::AppState;

/// RAG HTTP Server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server backed by the configured Ollama and Qdrant
    pub fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::from_config(config.clone())?;
        Ok(Self { config, state })
    }

    /// Create a server over prebuilt state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Shared state served by this server
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = routes::routes()
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the server and run until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting RAG server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RerankerKind;
    use crate::providers::{
        HashingEmbedder, InMemoryVectorStore, LlmProvider, VectorStoreProvider,
    };
    use crate::types::{
        ChunkPayload, CollectionInfo, IndexPoint, ScoredPoint, NO_CONTEXT_ANSWER,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct CountingLlm {
        reply: String,
        calls: Mutex<usize>,
    }

    impl CountingLlm {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl LlmProvider for CountingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            *self.calls.lock() += 1;
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    struct UnreachableStore;

    #[async_trait]
    impl VectorStoreProvider for UnreachableStore {
        async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
            Err(Error::vector_db("connection refused"))
        }

        async fn create_collection(&self, _dimensions: usize) -> Result<()> {
            Err(Error::vector_db("connection refused"))
        }

        async fn delete_collection(&self) -> Result<()> {
            Err(Error::vector_db("connection refused"))
        }

        async fn upsert(&self, _points: &[IndexPoint]) -> Result<()> {
            Err(Error::vector_db("connection refused"))
        }

        async fn search(&self, _vector: &[f32], _limit: usize) -> Result<Vec<ScoredPoint>> {
            Err(Error::vector_db("connection refused"))
        }

        async fn health_check(&self) -> Result<bool> {
            Err(Error::vector_db("connection refused"))
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    fn server(
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        reranker: RerankerKind,
    ) -> RagServer {
        let mut config = RagConfig::default();
        config.retrieval.reranker = reranker;
        let embedder = Arc::new(HashingEmbedder::new(64).unwrap());
        RagServer::with_state(AppState::new(config, embedder, store, llm))
    }

    async fn send(server: &RagServer, request: Request<Body>) -> (StatusCode, Value) {
        let response = server.build_router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ask_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_index() {
        let server = server(
            Arc::new(UnreachableStore),
            CountingLlm::new("{}"),
            RerankerKind::None,
        );
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&server, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "ok": true,
                "qdrant": false,
                "reranker": false,
                "ollama_model": "scripted",
                "embed_model": "hashing-64"
            })
        );
    }

    #[tokio::test]
    async fn test_health_reports_keyword_reranker() {
        let server = server(
            Arc::new(InMemoryVectorStore::new()),
            CountingLlm::new("{}"),
            RerankerKind::Keyword,
        );
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (_, body) = send(&server, request).await;

        assert_eq!(body["qdrant"], json!(true));
        assert_eq!(body["reranker"], json!(true));
    }

    #[tokio::test]
    async fn test_ask_on_empty_index_skips_model() {
        let llm = CountingLlm::new("{}");
        let server = server(
            Arc::new(InMemoryVectorStore::new()),
            llm.clone(),
            RerankerKind::None,
        );
        let (status, body) = send(&server, ask_request(json!({"q": "what is torque?"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], json!(NO_CONTEXT_ANSWER));
        assert_eq!(body["commands"], json!([{"tool": "ingest_status", "args": {}}]));
        assert_eq!(body["citations"], json!([]));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_ask_with_zero_k_gets_no_context_answer() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let store = Arc::new(InMemoryVectorStore::new());
        store.create_collection(64).await.unwrap();
        store
            .upsert(&[IndexPoint {
                id: 0,
                vector: embedder.embed_text("hello world"),
                payload: ChunkPayload::new("a.txt", 0, "hello world"),
            }])
            .await
            .unwrap();

        let llm = CountingLlm::new("{}");
        let server = server(store, llm.clone(), RerankerKind::None);
        let (status, body) = send(&server, ask_request(json!({"q": "hello", "k": 0}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], json!(NO_CONTEXT_ANSWER));
        assert_eq!(body["commands"], json!([{"tool": "ingest_status", "args": {}}]));
        assert_eq!(body["citations"], json!([]));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_ask_reports_retrieval_failure_as_answer() {
        let llm = CountingLlm::new("{}");
        let server = server(Arc::new(UnreachableStore), llm.clone(), RerankerKind::None);
        let (status, body) = send(&server, ask_request(json!({"q": "hi"}))).await;

        assert_eq!(status, StatusCode::OK);
        let answer = body["answer"].as_str().unwrap();
        assert!(answer.starts_with("Retrieval failed: "));
        assert!(answer.contains("connection refused"));
        assert_eq!(body["commands"], json!([]));
        assert_eq!(body["citations"], json!([]));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_ask_returns_model_answer() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let store = Arc::new(InMemoryVectorStore::new());
        store.create_collection(64).await.unwrap();
        let text = "torque the wheel nuts to 120 Nm";
        store
            .upsert(&[IndexPoint {
                id: 0,
                vector: embedder.embed_text(text),
                payload: ChunkPayload::new("manual.txt", 0, text),
            }])
            .await
            .unwrap();

        let reply = json!({
            "answer": "120 Nm",
            "commands": [],
            "citations": [{"doc_id": "manual.txt", "page": 0}]
        });
        let llm = CountingLlm::new(&reply.to_string());
        let server = server(store, llm.clone(), RerankerKind::None);
        let (status, body) = send(&server, ask_request(json!({"q": "wheel torque", "k": 3}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, reply);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_backend_check_reports_unreachable_store() {
        let healthy = server(
            Arc::new(InMemoryVectorStore::new()),
            CountingLlm::new("{}"),
            RerankerKind::None,
        );
        assert!(healthy.state().check_backends().await);

        let degraded = server(
            Arc::new(UnreachableStore),
            CountingLlm::new("{}"),
            RerankerKind::None,
        );
        assert!(!degraded.state().check_backends().await);
    }

    #[test]
    fn test_address_from_config() {
        let mut config = RagConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9000;
        let server = RagServer::with_state(AppState::new(
            config,
            Arc::new(HashingEmbedder::default()),
            Arc::new(InMemoryVectorStore::new()),
            CountingLlm::new("{}"),
        ));
        assert_eq!(server.address(), "127.0.0.1:9000");
    }
}
