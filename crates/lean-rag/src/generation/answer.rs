//! Answer service: retrieve, prompt, call the model, validate its JSON

use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::retrieval::ContextBuilder;
use crate::types::ModelResponse;

use super::prompt::PromptBuilder;

/// Keys a model reply must carry to be accepted
pub const REQUIRED_KEYS: [&str; 3] = ["answer", "commands", "citations"];

/// JSON reply standing in for a failed model call
pub fn llm_failure_json(message: &str) -> String {
    json!({
        "answer": format!("LLM call failed: {}", message),
        "commands": [],
        "citations": []
    })
    .to_string()
}

/// Slice from the first `{` to the last `}`, or the whole string when there is no such pair
fn clamp_to_braces(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw,
    }
}

/// Turn raw model text into a response, falling back on anything non-conforming
///
/// Accepted only if the clamped text parses as a JSON object that has all
/// three keys and matches the response schema. Otherwise the raw text
/// (trimmed, at most 800 characters) becomes the answer.
pub fn parse_model_output(raw: &str) -> ModelResponse {
    let candidate = clamp_to_braces(raw);

    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Model output is not JSON: {}", e);
            return ModelResponse::fallback_from_raw(raw);
        }
    };

    let has_required_keys = value
        .as_object()
        .map_or(false, |map| REQUIRED_KEYS.iter().all(|key| map.contains_key(*key)));
    if !has_required_keys {
        tracing::debug!("Model output is missing required keys");
        return ModelResponse::fallback_from_raw(raw);
    }

    match serde_json::from_value(value) {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Model output does not match the schema: {}", e);
            ModelResponse::fallback_from_raw(raw)
        }
    }
}

/// Retrieval plus generation behind one call
pub struct AnswerService {
    context_builder: Arc<ContextBuilder>,
    llm: Arc<dyn LlmProvider>,
}

impl AnswerService {
    /// Create an answer service over injected collaborators
    pub fn new(context_builder: Arc<ContextBuilder>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            context_builder,
            llm,
        }
    }

    /// Context builder in use
    pub fn context_builder(&self) -> &ContextBuilder {
        &self.context_builder
    }

    /// Call the model; failures come back as a JSON reply carrying the error
    pub async fn invoke_model(&self, prompt: &str) -> String {
        match self.llm.generate(prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("LLM call failed: {}", e);
                llm_failure_json(&e.to_string())
            }
        }
    }

    /// Answer `query` from the top `k` candidates
    ///
    /// Retrieval errors are returned; model errors and malformed model output
    /// never are.
    pub async fn answer(&self, query: &str, k: usize) -> Result<ModelResponse> {
        if k == 0 {
            tracing::info!("k is 0; skipping retrieval and model call");
            return Ok(ModelResponse::no_context());
        }

        let retrieved = self.context_builder.build_context(query, k).await?;

        if retrieved.is_empty() {
            tracing::info!("No context for query; skipping model call");
            return Ok(ModelResponse::no_context());
        }

        let prompt = PromptBuilder::build_answer_prompt(query, &retrieved.context);
        let raw = self.invoke_model(&prompt).await;
        Ok(parse_model_output(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalConfig;
    use crate::error::Error;
    use crate::providers::{EmbeddingProvider, HashingEmbedder, InMemoryVectorStore, VectorStoreProvider};
    use crate::retrieval::NoopReranker;
    use crate::types::{ChunkPayload, Citation, IndexPoint, FALLBACK_ANSWER_CHARS};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Replays a fixed reply (or error) and records prompts
    struct ScriptedLlm {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            self.reply.clone().map_err(Error::llm)
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    async fn service(llm: Arc<ScriptedLlm>, texts: &[&str]) -> AnswerService {
        let embedder = Arc::new(HashingEmbedder::default());
        let store = Arc::new(InMemoryVectorStore::new());
        if !texts.is_empty() {
            store.create_collection(embedder.dimensions().await.unwrap()).await.unwrap();
            let mut points = Vec::new();
            for (i, text) in texts.iter().enumerate() {
                points.push(IndexPoint {
                    id: i as u64,
                    vector: embedder.embed(text).await.unwrap(),
                    payload: ChunkPayload::new("manual.txt", i as u32, *text),
                });
            }
            store.upsert(&points).await.unwrap();
        }

        let context_builder = ContextBuilder::new(
            embedder,
            store,
            Arc::new(NoopReranker),
            &RetrievalConfig::default(),
        );
        AnswerService::new(Arc::new(context_builder), llm)
    }

    #[test]
    fn test_malformed_output_falls_back_to_raw_text() {
        let raw = "Sure! Here's the answer: {not valid json";
        let response = parse_model_output(raw);
        assert_eq!(response, ModelResponse::message(raw));
    }

    #[test]
    fn test_long_malformed_output_is_truncated() {
        let raw = format!("{}{{", "a".repeat(2000));
        let response = parse_model_output(&raw);
        assert_eq!(response.answer.chars().count(), FALLBACK_ANSWER_CHARS);
        assert!(response.commands.is_empty());
        assert!(response.citations.is_empty());
    }

    #[test]
    fn test_valid_output_is_clamped_out_of_noise() {
        let response = parse_model_output(
            r#"prefix noise {"answer":"x","commands":[],"citations":[{"doc_id":"a","page":1}]} trailing noise"#,
        );
        assert_eq!(
            response,
            ModelResponse {
                answer: "x".to_string(),
                commands: Vec::new(),
                citations: vec![Citation {
                    doc_id: "a".to_string(),
                    page: 1
                }],
            }
        );
    }

    #[test]
    fn test_missing_key_falls_back() {
        let raw = r#"{"answer":"x","commands":[]}"#;
        assert_eq!(parse_model_output(raw), ModelResponse::message(raw));
    }

    #[test]
    fn test_non_object_falls_back() {
        assert_eq!(parse_model_output("[1, 2]"), ModelResponse::message("[1, 2]"));
    }

    #[test]
    fn test_null_field_falls_back() {
        let raw = r#"{"answer":null,"commands":[],"citations":[]}"#;
        assert_eq!(parse_model_output(raw).answer, raw);
    }

    #[test]
    fn test_empty_output_gets_generic_answer() {
        assert_eq!(
            parse_model_output("   ").answer,
            crate::types::EMPTY_MODEL_ANSWER
        );
    }

    #[test]
    fn test_failure_json_is_valid_and_escaped() {
        let raw = llm_failure_json(r#"connect "refused""#);
        let response = parse_model_output(&raw);
        assert_eq!(response.answer, r#"LLM call failed: connect "refused""#);
        assert!(response.commands.is_empty());
    }

    #[tokio::test]
    async fn test_empty_index_skips_model() {
        let llm = Arc::new(ScriptedLlm::replying("{}"));
        let response = service(llm.clone(), &[]).await.answer("anything", 5).await.unwrap();

        assert_eq!(response, ModelResponse::no_context());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_k_skips_retrieval_and_model() {
        let llm = Arc::new(ScriptedLlm::replying("{}"));
        let response = service(llm.clone(), &["indexed text"])
            .await
            .answer("anything", 0)
            .await
            .unwrap();

        assert_eq!(response, ModelResponse::no_context());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_answer_uses_context_and_parses_reply() {
        let llm = Arc::new(ScriptedLlm::replying(
            r#"{"answer":"40 Nm","commands":[{"tool":"open_url","args":{"url":"http://x"}}],"citations":[{"doc_id":"manual.txt","page":0}]}"#,
        ));
        let response = service(llm.clone(), &["tighten the wheel bolts to 40 Nm"])
            .await
            .answer("wheel bolt torque", 5)
            .await
            .unwrap();

        assert_eq!(response.answer, "40 Nm");
        assert_eq!(response.commands[0].tool, "open_url");
        assert_eq!(llm.calls(), 1);
        assert!(llm.prompts.lock()[0].contains("[manual.txt#0] tighten the wheel bolts to 40 Nm"));
    }

    #[tokio::test]
    async fn test_llm_failure_becomes_answer() {
        let llm = Arc::new(ScriptedLlm::failing("timed out"));
        let response = service(llm, &["some indexed text"])
            .await
            .answer("question", 5)
            .await
            .unwrap();

        assert!(response.answer.starts_with("LLM call failed:"));
        assert!(response.answer.contains("timed out"));
        assert!(response.commands.is_empty());
        assert!(response.citations.is_empty());
    }
}
