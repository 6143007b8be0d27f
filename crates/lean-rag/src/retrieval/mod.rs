//! Query-time retrieval: vector search, reranking and context assembly

pub mod context;
pub mod reranker;

pub use context::{ContextBuilder, RetrievedContext};
pub use reranker::{KeywordReranker, NoopReranker, Reranker};
