//! Provider abstractions for embeddings, generation and vector search
//!
//! Every external collaborator sits behind a trait so the pipeline can be
//! constructed once at start-up and handed its dependencies explicitly.

pub mod embedding;
pub mod hashing;
pub mod llm;
pub mod memory;
pub mod ollama;
pub mod qdrant;
pub mod retry;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use hashing::HashingEmbedder;
pub use llm::LlmProvider;
pub use memory::InMemoryVectorStore;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use qdrant::QdrantStore;
pub use vector_store::VectorStoreProvider;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::Result;

/// Build the embedding backend selected in config
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(config)?),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(
            config
                .dimensions
                .unwrap_or(hashing::DEFAULT_HASHING_DIMENSIONS),
        )?),
    };
    Ok(embedder)
}
