//! Reranking strategies applied after vector search

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::RerankerKind;
use crate::types::ScoredPassage;

/// Reorders and cuts similarity-ranked passages
pub trait Reranker: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Whether this is a real reranker, reported by `/health`
    fn is_available(&self) -> bool;

    /// Return at most `top_n` passages in their new order
    fn rerank(&self, query: &str, passages: Vec<ScoredPassage>, top_n: usize) -> Vec<ScoredPassage>;
}

/// Build the reranker selected in config
pub fn from_kind(kind: RerankerKind) -> Arc<dyn Reranker> {
    match kind {
        RerankerKind::None => Arc::new(NoopReranker),
        RerankerKind::Keyword => Arc::new(KeywordReranker::default()),
    }
}

/// Keeps similarity order; takes the first `top_n`
#[derive(Debug, Clone, Default)]
pub struct NoopReranker;

impl Reranker for NoopReranker {
    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn rerank(&self, _query: &str, mut passages: Vec<ScoredPassage>, top_n: usize) -> Vec<ScoredPassage> {
        passages.truncate(top_n);
        passages
    }
}

/// Orders passages by how many distinct query terms they contain
///
/// The sort is stable, so passages with equal counts keep their similarity order.
#[derive(Debug, Clone)]
pub struct KeywordReranker {
    /// Shorter query terms are ignored
    min_term_chars: usize,
}

impl Default for KeywordReranker {
    fn default() -> Self {
        Self { min_term_chars: 3 }
    }
}

impl KeywordReranker {
    /// Distinct lower-case query terms worth matching
    pub fn terms(&self, query: &str) -> BTreeSet<String> {
        query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|term| term.chars().count() >= self.min_term_chars)
            .map(str::to_lowercase)
            .collect()
    }

    fn match_count(terms: &BTreeSet<String>, text: &str) -> usize {
        let text = text.to_lowercase();
        terms.iter().filter(|term| text.contains(term.as_str())).count()
    }
}

impl Reranker for KeywordReranker {
    fn name(&self) -> &str {
        "keyword"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn rerank(&self, query: &str, passages: Vec<ScoredPassage>, top_n: usize) -> Vec<ScoredPassage> {
        let terms = self.terms(query);
        let mut scored: Vec<(usize, ScoredPassage)> = passages
            .into_iter()
            .map(|p| (Self::match_count(&terms, &p.text), p))
            .collect();

        scored.sort_by_key(|(count, _)| Reverse(*count));
        scored.into_iter().take(top_n).map(|(_, p)| p).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn passages(texts: &[&str]) -> Vec<ScoredPassage> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| ScoredPassage {
                text: text.to_string(),
                payload: Map::new(),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }

    fn texts(passages: &[ScoredPassage]) -> Vec<&str> {
        passages.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_noop_keeps_order_and_truncates() {
        let ranked = NoopReranker.rerank("anything", passages(&["a", "b", "c", "d"]), 2);
        assert_eq!(texts(&ranked), vec!["a", "b"]);
        assert!(!NoopReranker.is_available());
    }

    #[test]
    fn test_noop_with_fewer_passages_than_top_n() {
        let ranked = NoopReranker.rerank("q", passages(&["a"]), 10);
        assert_eq!(texts(&ranked), vec!["a"]);
    }

    #[test]
    fn test_keyword_terms_skip_short_words() {
        let terms = KeywordReranker::default().terms("How do I reset the Pump? pump!");
        assert_eq!(
            terms.into_iter().collect::<Vec<_>>(),
            vec!["how", "pump", "reset", "the"]
        );
    }

    #[test]
    fn test_keyword_reorders_stably() {
        let ranked = KeywordReranker::default().rerank(
            "reset hydraulic pump",
            passages(&[
                "cafeteria menu",
                "pump maintenance",
                "reset the hydraulic pump by holding the button",
                "pump wiring",
            ]),
            3,
        );
        assert_eq!(
            texts(&ranked),
            vec![
                "reset the hydraulic pump by holding the button",
                "pump maintenance",
                "pump wiring"
            ]
        );
    }

    #[test]
    fn test_from_kind() {
        assert_eq!(from_kind(RerankerKind::None).name(), "none");
        assert!(from_kind(RerankerKind::Keyword).is_available());
    }
}
