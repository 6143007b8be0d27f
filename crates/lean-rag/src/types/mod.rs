//! Core types shared across the pipeline

pub mod chunk;
pub mod query;
pub mod response;

pub use chunk::{ChunkPayload, CollectionInfo, IndexPoint, PointId, ScoredPassage, ScoredPoint};
pub use query::AskRequest;
pub use response::{
    Citation, Command, HealthResponse, ModelResponse, EMPTY_MODEL_ANSWER, FALLBACK_ANSWER_CHARS,
    NO_CONTEXT_ANSWER,
};
