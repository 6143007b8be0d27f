//! Query request types

use serde::{Deserialize, Serialize};

/// Body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question
    pub q: String,
    /// Nearest-neighbour candidates; the configured `top_k` when omitted
    #[serde(default)]
    pub k: Option<usize>,
}

impl AskRequest {
    /// Candidate count to request, falling back to `default_k`
    pub fn k_or(&self, default_k: usize) -> usize {
        self.k.unwrap_or(default_k)
    }
}
