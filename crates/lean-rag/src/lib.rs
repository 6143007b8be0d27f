//! lean-rag: a small retrieval-augmented question answering pipeline
//!
//! Three stages share this crate:
//! - `extraction` turns heterogeneous documents (PDF, Office, HTML, ...) into plain text
//! - `ingestion` chunks that text into word windows, embeds it and upserts it into Qdrant
//! - `retrieval` and `generation` answer questions from the index with a local
//!   Ollama model, always returning a JSON object with `answer`, `commands` and
//!   `citations`
//!
//! The HTTP surface (`/health`, `/ask`) lives in `server`.

pub mod config;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    query::AskRequest,
    response::{Citation, Command, ModelResponse},
};
