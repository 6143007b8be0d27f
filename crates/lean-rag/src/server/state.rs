//! Application state for the HTTP server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::AnswerService;
use crate::providers::{
    embedder_from_config, EmbeddingProvider, LlmProvider, OllamaLlm, QdrantStore,
    VectorStoreProvider,
};
use crate::retrieval::{reranker, ContextBuilder};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Embedding provider, shared by retrieval
    embedder: Arc<dyn EmbeddingProvider>,
    /// Vector index
    store: Arc<dyn VectorStoreProvider>,
    /// Generation model
    llm: Arc<dyn LlmProvider>,
    /// Retrieval plus generation
    answer_service: AnswerService,
}

impl AppState {
    /// Construct the production providers (Ollama, Qdrant) from config
    pub fn from_config(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let embedder = embedder_from_config(&config.embeddings)?;
        tracing::info!("Embedding provider: {}", embedder.model());

        let store: Arc<dyn VectorStoreProvider> = Arc::new(QdrantStore::new(&config.vector_db)?);
        tracing::info!(
            "Vector index: {} (collection '{}')",
            config.vector_db.url(),
            config.vector_db.collection
        );

        let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::new(&config.llm)?);
        tracing::info!("LLM: {} at {}", config.llm.model, config.llm.base_url);

        Ok(Self::new(config, embedder, store, llm))
    }

    /// Assemble state from already-built providers
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let reranker = reranker::from_kind(config.retrieval.reranker);
        tracing::info!("Reranker: {}", reranker.name());

        let context_builder = ContextBuilder::new(
            embedder.clone(),
            store.clone(),
            reranker,
            &config.retrieval,
        );
        let answer_service = AnswerService::new(Arc::new(context_builder), llm.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                embedder,
                store,
                llm,
                answer_service,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get the vector index
    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.inner.store
    }

    /// Get the generation model
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    /// Get the answer service
    pub fn answer_service(&self) -> &AnswerService {
        &self.inner.answer_service
    }

    /// Probe every backend once, logging the result; true when all are reachable
    pub async fn check_backends(&self) -> bool {
        let checks = [
            ("Embedding model", self.embedder().model().to_string(), self.embedder().health_check().await),
            ("LLM", self.llm().model().to_string(), self.llm().health_check().await),
            ("Vector index", self.store().name().to_string(), self.store().health_check().await),
        ];

        let mut all_ok = true;
        for (what, name, result) in checks {
            match result {
                Ok(true) => tracing::info!("{} '{}' is available", what, name),
                Ok(false) => {
                    tracing::warn!("{} '{}' is not ready", what, name);
                    all_ok = false;
                }
                Err(e) => {
                    tracing::warn!("{} '{}' unreachable: {}", what, name, e);
                    all_ok = false;
                }
            }
        }
        all_ok
    }
}
