//! Chunk payloads and vector-index point types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload stored with every indexed chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Source document name (file name at ingestion time)
    pub doc_id: String,
    /// Sequence index of the chunk within its document, starting at 0
    pub page: u32,
    /// Chunk text
    pub text: String,
}

impl ChunkPayload {
    /// Create a new payload
    pub fn new(doc_id: impl Into<String>, page: u32, text: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            page,
            text: text.into(),
        }
    }

    /// Payload as a JSON mapping
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("doc_id".to_string(), Value::from(self.doc_id.clone()));
        map.insert("page".to_string(), Value::from(self.page));
        map.insert("text".to_string(), Value::from(self.text.clone()));
        map
    }
}

/// One entry to upsert into the vector index
#[derive(Debug, Clone, Serialize)]
pub struct IndexPoint {
    /// Point id, unique within the collection
    pub id: u64,
    /// Embedding of `payload.text`
    pub vector: Vec<f32>,
    /// Chunk payload
    pub payload: ChunkPayload,
}

/// Point id as returned by the index (Qdrant allows integers or UUIDs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

/// A search hit with its raw payload
///
/// The payload is kept as an untyped mapping: entries written by other tools
/// may lack fields, and retrieval must tolerate that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    /// Point id
    pub id: PointId,
    /// Cosine similarity, higher is closer
    pub score: f32,
    /// Stored payload
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
}

/// A retrieved passage, text already normalised and truncated
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    /// Passage text as it will appear in the prompt
    pub text: String,
    /// Payload mapping used for labelling and citations
    pub payload: Map<String, Value>,
    /// Similarity score from the index
    pub score: f32,
}

impl ScoredPassage {
    /// `doc_id` label, `?` when absent
    pub fn doc_id(&self) -> String {
        match self.payload.get("doc_id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "?".to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// `page` label, 0 when absent or not an integer
    pub fn page(&self) -> i64 {
        self.payload
            .get("page")
            .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(0)
    }
}

/// Shape of an existing collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    /// Vector dimension
    pub vector_size: usize,
    /// Distance metric name as reported by the index (e.g. `Cosine`)
    pub distance: String,
}

impl CollectionInfo {
    /// Whether this collection can hold vectors of `dimensions` under cosine distance
    pub fn matches(&self, dimensions: usize) -> bool {
        self.vector_size == dimensions && self.distance.eq_ignore_ascii_case("cosine")
    }
}
