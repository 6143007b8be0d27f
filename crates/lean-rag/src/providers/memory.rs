//! In-process vector store
//!
//! Brute-force cosine search over a single collection. Used by tests and
//! for running the pipeline without a Qdrant instance.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::{ChunkPayload, CollectionInfo, IndexPoint, PointId, ScoredPoint};

use super::vector_store::VectorStoreProvider;

struct MemoryCollection {
    dimensions: usize,
    points: BTreeMap<u64, (Vec<f32>, ChunkPayload)>,
}

/// In-memory vector store
#[derive(Default)]
pub struct InMemoryVectorStore {
    collection: RwLock<Option<MemoryCollection>>,
}

impl InMemoryVectorStore {
    /// Create an empty store with no collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored points
    pub fn len(&self) -> usize {
        self.collection
            .read()
            .as_ref()
            .map(|c| c.points.len())
            .unwrap_or(0)
    }

    /// Whether the store holds no points
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored payload for `id`
    pub fn payload(&self, id: u64) -> Option<ChunkPayload> {
        self.collection
            .read()
            .as_ref()
            .and_then(|c| c.points.get(&id).map(|(_, payload)| payload.clone()))
    }
}

/// Cosine similarity; 0 for mismatched lengths or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
        Ok(self.collection.read().as_ref().map(|c| CollectionInfo {
            vector_size: c.dimensions,
            distance: "Cosine".to_string(),
        }))
    }

    async fn create_collection(&self, dimensions: usize) -> Result<()> {
        *self.collection.write() = Some(MemoryCollection {
            dimensions,
            points: BTreeMap::new(),
        });
        Ok(())
    }

    async fn delete_collection(&self) -> Result<()> {
        *self.collection.write() = None;
        Ok(())
    }

    async fn upsert(&self, points: &[IndexPoint]) -> Result<()> {
        let mut guard = self.collection.write();
        let collection = guard
            .as_mut()
            .ok_or_else(|| Error::vector_db("collection does not exist"))?;

        for point in points {
            if point.vector.len() != collection.dimensions {
                return Err(Error::vector_db(format!(
                    "point {} has {} dimensions, collection expects {}",
                    point.id,
                    point.vector.len(),
                    collection.dimensions
                )));
            }
        }

        for point in points {
            collection
                .points
                .insert(point.id, (point.vector.clone(), point.payload.clone()));
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let guard = self.collection.read();
        let Some(collection) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<ScoredPoint> = collection
            .points
            .iter()
            .map(|(id, (stored, payload))| ScoredPoint {
                id: PointId::Num(*id),
                score: cosine_similarity(vector, stored),
                payload: Some(payload.to_map()),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
