//! Context assembly: embed, search, truncate, rerank, serialise

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{ScoredPassage, ScoredPoint};

use super::reranker::Reranker;

/// Context block plus the payloads behind each line, in the same order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    /// One `[doc_id#page] text` line per passage
    pub context: String,
    /// Payload mapping of each passage, for citations
    pub payloads: Vec<Map<String, Value>>,
}

impl RetrievedContext {
    /// Whether nothing usable was retrieved
    pub fn is_empty(&self) -> bool {
        self.context.trim().is_empty()
    }
}

/// Builds prompt context for a query from the vector index
pub struct ContextBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    reranker: Arc<dyn Reranker>,
    rerank_top_n: usize,
    max_ctx_chars: usize,
}

impl ContextBuilder {
    /// Create a context builder over injected providers
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        reranker: Arc<dyn Reranker>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            reranker,
            rerank_top_n: config.rerank_top_n,
            max_ctx_chars: config.max_ctx_chars,
        }
    }

    /// Active reranker
    pub fn reranker(&self) -> &dyn Reranker {
        self.reranker.as_ref()
    }

    /// Turn a search hit into a prompt passage
    ///
    /// Missing `text` is treated as empty; newlines become spaces and the
    /// result is cut to `max_chars` characters.
    pub fn to_passage(point: ScoredPoint, max_chars: usize) -> ScoredPassage {
        let payload = point.payload.unwrap_or_default();
        let text = payload
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .replace('\n', " ")
            .chars()
            .take(max_chars)
            .collect();

        ScoredPassage {
            text,
            payload,
            score: point.score,
        }
    }

    /// Context line for one passage
    pub fn format_line(passage: &ScoredPassage) -> String {
        format!("[{}#{}] {}", passage.doc_id(), passage.page(), passage.text)
    }

    /// Retrieve the top `k` candidates for `query` and assemble the context block
    pub async fn build_context(&self, query: &str, k: usize) -> Result<RetrievedContext> {
        let vector = self.embedder.embed(query).await?;
        let hits = self.store.search(&vector, k).await?;
        tracing::debug!("Search returned {} hits (k={})", hits.len(), k);

        let passages: Vec<ScoredPassage> = hits
            .into_iter()
            .map(|hit| Self::to_passage(hit, self.max_ctx_chars))
            .collect();

        let ranked = self.reranker.rerank(query, passages, self.rerank_top_n);
        tracing::debug!("{} passages after {} reranker", ranked.len(), self.reranker.name());

        let context = ranked
            .iter()
            .map(Self::format_line)
            .collect::<Vec<_>>()
            .join("\n");
        let payloads = ranked.into_iter().map(|p| p.payload).collect();

        Ok(RetrievedContext { context, payloads })
    }
}
