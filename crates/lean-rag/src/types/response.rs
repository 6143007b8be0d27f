//! Response types returned to callers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Answer returned when retrieval produced no context
pub const NO_CONTEXT_ANSWER: &str =
    "No indexed content matched (or empty index). Run ingestion and try again.";

/// Answer used when the model produced nothing usable
pub const EMPTY_MODEL_ANSWER: &str = "Model returned no content.";

/// Longest raw model text echoed back in a fallback answer
pub const FALLBACK_ANSWER_CHARS: usize = 800;

/// A follow-up action suggested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Tool name
    pub tool: String,
    /// Tool arguments
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl Command {
    /// Command with no arguments
    pub fn bare(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            args: Map::new(),
        }
    }
}

/// Reference to a retrieved chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source document
    pub doc_id: String,
    /// Chunk sequence index within the document
    pub page: u32,
}

/// The answer contract: all three keys always present, never null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Answer text, or a clarifying question
    pub answer: String,
    /// Suggested tool invocations, in order
    pub commands: Vec<Command>,
    /// Supporting chunks, in order
    pub citations: Vec<Citation>,
}

impl ModelResponse {
    /// Plain answer with no commands or citations
    pub fn message(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            commands: Vec::new(),
            citations: Vec::new(),
        }
    }

    /// Fixed response for an empty context; points the caller at ingestion
    pub fn no_context() -> Self {
        Self {
            answer: NO_CONTEXT_ANSWER.to_string(),
            commands: vec![Command::bare("ingest_status")],
            citations: Vec::new(),
        }
    }

    /// Fallback built from unusable model output
    pub fn fallback_from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::message(EMPTY_MODEL_ANSWER);
        }
        Self::message(trimmed.chars().take(FALLBACK_ANSWER_CHARS).collect::<String>())
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// The service itself is up
    pub ok: bool,
    /// Vector index reachable
    pub qdrant: bool,
    /// A real reranker is configured
    pub reranker: bool,
    /// Generation model name
    pub ollama_model: String,
    /// Embedding model name
    pub embed_model: String,
}
