//! LLM provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Trait for prompt-in, text-out generation
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run the prompt and return the raw model text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, reported by `/health`
    fn model(&self) -> &str;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;
}
