//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CollectionInfo, IndexPoint, ScoredPoint};

/// Trait for a single-collection nearest-neighbour index using cosine distance
///
/// Implementations:
/// - `QdrantStore`: Qdrant over REST
/// - `InMemoryVectorStore`: brute-force in-process store
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Shape of the collection, `None` when it does not exist
    async fn collection_info(&self) -> Result<Option<CollectionInfo>>;

    /// Create the collection with cosine distance
    async fn create_collection(&self, dimensions: usize) -> Result<()>;

    /// Drop the collection; absent collections are not an error
    async fn delete_collection(&self) -> Result<()>;

    /// Insert or overwrite points by id
    async fn upsert(&self, points: &[IndexPoint]) -> Result<()>;

    /// Top `limit` points by similarity, highest first
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>>;

    /// Probe the index; an `Err` means it could not be reached
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
