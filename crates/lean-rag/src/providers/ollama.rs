//! Ollama client for embeddings and JSON-mode generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::retry::{retry_with_backoff, DEFAULT_BASE_DELAY};

/// Thin Ollama REST client shared by the embedder and the LLM
#[derive(Clone)]
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Server base URL without trailing slash
    base_url: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Body of `POST /api/generate`
///
/// `format` is sent both top-level and inside `options`; older servers only
/// honour the latter.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
    pub options: GenerateOptions,
}

/// Decoding options for `/api/generate`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub format: String,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub num_predict: u32,
    pub num_ctx: u32,
}

impl GenerateRequest {
    /// Non-streaming JSON-mode request using the configured decoding options
    pub fn from_config(config: &LlmConfig, prompt: impl Into<String>) -> Self {
        Self {
            model: config.model.clone(),
            prompt: prompt.into(),
            stream: false,
            format: "json".to_string(),
            options: GenerateOptions {
                format: "json".to_string(),
                temperature: config.temperature,
                top_p: config.top_p,
                repeat_penalty: config.repeat_penalty,
                num_predict: config.num_predict,
                num_ctx: config.num_ctx,
            },
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    /// Create a new client for `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed one text with `model`
    pub async fn embed(&self, model: &str, text: &str, timeout: Duration) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&EmbedRequest {
                model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Embedding failed: HTTP {} - {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        if embed_response.embedding.is_empty() {
            return Err(Error::embedding(format!(
                "Model '{}' returned an empty embedding",
                model
            )));
        }

        Ok(embed_response.embedding)
    }

    /// Run a single generation request and return the raw `response` text
    pub async fn generate(&self, request: &GenerateRequest, timeout: Duration) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Generation failed: HTTP {} - {}",
                status, body
            )));
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse generation response: {}", e)))?;

        Ok(generate_response.response)
    }
}

/// Embedding provider backed by Ollama `/api/embeddings`
pub struct OllamaEmbedder {
    client: OllamaClient,
    config: EmbeddingConfig,
    /// Dimension from config, or probed once from the model
    dimensions: OnceCell<usize>,
}

impl OllamaEmbedder {
    /// Create an embedder from config
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let dimensions = match config.dimensions {
            Some(dim) => OnceCell::new_with(Some(dim)),
            None => OnceCell::new(),
        };

        Ok(Self {
            client: OllamaClient::new(&config.base_url)?,
            config: config.clone(),
            dimensions,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let timeout = self.timeout();
        let embedding = retry_with_backoff(
            "Embedding request",
            self.config.max_retries,
            DEFAULT_BASE_DELAY,
            || self.client.embed(&self.config.model, text, timeout),
        )
        .await?;

        if let Some(&expected) = self.dimensions.get() {
            if embedding.len() != expected {
                return Err(Error::embedding(format!(
                    "Model '{}' returned {} dimensions, expected {}",
                    self.config.model,
                    embedding.len(),
                    expected
                )));
            }
        }

        Ok(embedding)
    }

    async fn dimensions(&self) -> Result<usize> {
        self.dimensions
            .get_or_try_init(|| async {
                let probe = self
                    .client
                    .embed(&self.config.model, "dimension probe", self.timeout())
                    .await?;
                tracing::info!(
                    "Embedding model {} has {} dimensions",
                    self.config.model,
                    probe.len()
                );
                Ok::<_, Error>(probe.len())
            })
            .await
            .copied()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }
}

/// Generation provider backed by Ollama `/api/generate` in JSON mode
pub struct OllamaLlm {
    client: OllamaClient,
    config: LlmConfig,
}

impl OllamaLlm {
    /// Create an LLM provider from config
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: OllamaClient::new(&config.base_url)?,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::info!("Generating answer with model: {}", self.config.model);
        let request = GenerateRequest::from_config(&self.config, prompt);
        // Generation is not retried; a timed-out request may still be running server-side.
        self.client
            .generate(&request, Duration::from_secs(self.config.timeout_secs))
            .await
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest::from_config(&LlmConfig::default(), "question?");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "qwen2:7b-instruct");
        assert_eq!(value["stream"], false);
        assert_eq!(value["format"], "json");
        assert_eq!(value["options"]["format"], "json");
        assert_eq!(value["options"]["temperature"], json!(0.0));
        assert_eq!(value["options"]["num_predict"], 128);
        assert_eq!(value["options"]["num_ctx"], 4096);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/").unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_configured_dimensions_skip_probe() {
        let config = EmbeddingConfig {
            dimensions: Some(384),
            // Unroutable; the probe would fail if it ran
            base_url: "http://127.0.0.1:9".to_string(),
            ..EmbeddingConfig::default()
        };
        let embedder = OllamaEmbedder::new(&config).unwrap();
        assert_eq!(embedder.dimensions().await.unwrap(), 384);
    }
}
