//! Configuration for the RAG pipeline
//!
//! Values are resolved in three layers: built-in defaults, an optional TOML
//! file, then environment variables (the names the deployment scripts export,
//! e.g. `QDRANT_HOST`, `TOP_K`, `CHUNK_SIZE`).

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "LEAN_RAG_CONFIG";

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "lean-rag.toml";

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Vector index (Qdrant) configuration
    pub vector_db: VectorDbConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Word-window chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval and context-building configuration
    pub retrieval: RetrievalConfig,
    /// Offline ingestion configuration
    pub ingestion: IngestionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable permissive CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Qdrant connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Qdrant host
    pub host: String,
    /// Qdrant REST port
    pub port: u16,
    /// Collection holding the chunk vectors
    pub collection: String,
    /// Retries for a failed upsert batch (upserts are idempotent per id)
    pub upsert_retries: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6333,
            collection: "docs".to_string(),
            upsert_retries: 2,
            timeout_secs: 30,
        }
    }
}

impl VectorDbConfig {
    /// Base REST URL, e.g. `http://localhost:6333`
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Which embedding backend to construct at start-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Ollama `/api/embeddings`
    #[default]
    Ollama,
    /// Offline feature-hashing embedder
    Hashing,
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "hashing" => Ok(Self::Hashing),
            other => Err(format!("unknown embedding provider '{}'", other)),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend used for both ingestion and query embedding
    pub provider: EmbeddingBackend,
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Output dimension; probed from the model when unset
    pub dimensions: Option<usize>,
    /// Retries for a failed embedding request
    pub max_retries: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: None,
            max_retries: 2,
            timeout_secs: 60,
        }
    }
}

/// LLM (Ollama) configuration
///
/// Decoding is deterministic by default: temperature 0, a low top-p and a
/// short output budget, since answers must be a single small JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Repetition penalty
    pub repeat_penalty: f32,
    /// Maximum tokens to generate
    pub num_predict: u32,
    /// Context window size (tokens)
    pub num_ctx: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2:7b-instruct".to_string(),
            temperature: 0.0,
            top_p: 0.1,
            repeat_penalty: 1.05,
            num_predict: 128,
            num_ctx: 4096,
            timeout_secs: 120,
        }
    }
}

/// Word-window chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Words per chunk
    pub chunk_size: usize,
    /// Words shared with the previous chunk
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 120,
        }
    }
}

/// Reranking strategy selected at construction time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankerKind {
    /// Keep similarity order, take the first N
    #[default]
    None,
    /// Reorder by query-term overlap
    Keyword,
}

impl FromStr for RerankerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "noop" | "" => Ok(Self::None),
            "keyword" => Ok(Self::Keyword),
            other => Err(format!("unknown reranker '{}'", other)),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Nearest-neighbour candidates requested when the caller omits `k`
    pub top_k: usize,
    /// Passages kept after reranking
    pub rerank_top_n: usize,
    /// Per-passage character budget in the prompt
    pub max_ctx_chars: usize,
    /// Reranking strategy
    pub reranker: RerankerKind,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 16,
            rerank_top_n: 5,
            max_ctx_chars: 500,
            reranker: RerankerKind::None,
        }
    }
}

/// How point ids are assigned during ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Per-run counter starting at 0
    #[default]
    Sequential,
    /// Derived from a SHA-256 of the chunk payload
    ContentHash,
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(Self::Sequential),
            "content_hash" => Ok(Self::ContentHash),
            other => Err(format!("unknown id strategy '{}'", other)),
        }
    }
}

/// Offline ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Folder ingested when none is given on the command line
    pub corpus_dir: PathBuf,
    /// Points per upsert request
    pub batch_size: usize,
    /// Point id assignment
    pub id_strategy: IdStrategy,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("corpus"),
            batch_size: 256,
            id_strategy: IdStrategy::Sequential,
        }
    }
}

impl RagConfig {
    /// Load defaults, then the config file (if any), then environment overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
                candidate.exists().then_some(candidate)
            });

        let mut config = match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file; missing sections keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_with(&lookup, "HOST", &mut self.server.host)?;
        override_with(&lookup, "PORT", &mut self.server.port)?;

        override_with(&lookup, "QDRANT_HOST", &mut self.vector_db.host)?;
        override_with(&lookup, "QDRANT_PORT", &mut self.vector_db.port)?;
        override_with(&lookup, "QDRANT_COLLECTION", &mut self.vector_db.collection)?;

        override_with(&lookup, "EMBED_PROVIDER", &mut self.embeddings.provider)?;
        override_with(&lookup, "EMBED_MODEL", &mut self.embeddings.model)?;
        if let Some(raw) = lookup("EMBED_DIMENSIONS") {
            self.embeddings.dimensions = Some(parse_value("EMBED_DIMENSIONS", &raw)?);
        }

        if let Some(url) = lookup("OLLAMA_URL") {
            self.embeddings.base_url = url.clone();
            self.llm.base_url = url;
        }
        override_with(&lookup, "OLLAMA_MODEL", &mut self.llm.model)?;

        override_with(&lookup, "TOP_K", &mut self.retrieval.top_k)?;
        override_with(&lookup, "RERANK_TOP_N", &mut self.retrieval.rerank_top_n)?;
        override_with(&lookup, "MAX_CTX_CHARS", &mut self.retrieval.max_ctx_chars)?;
        override_with(&lookup, "RERANKER", &mut self.retrieval.reranker)?;

        override_with(&lookup, "CHUNK_SIZE", &mut self.chunking.chunk_size)?;
        override_with(&lookup, "CHUNK_OVERLAP", &mut self.chunking.chunk_overlap)?;

        override_with(&lookup, "ID_STRATEGY", &mut self.ingestion.id_strategy)?;

        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than 0"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("top_k must be greater than 0"));
        }
        if self.retrieval.rerank_top_n == 0 {
            return Err(Error::config("rerank_top_n must be greater than 0"));
        }
        if self.retrieval.max_ctx_chars == 0 {
            return Err(Error::config("max_ctx_chars must be greater than 0"));
        }
        if self.ingestion.batch_size == 0 {
            return Err(Error::config("batch_size must be greater than 0"));
        }
        if self.embeddings.dimensions == Some(0) {
            return Err(Error::config("embedding dimensions must be greater than 0"));
        }
        Ok(())
    }
}

fn override_with<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    if let Some(raw) = lookup(key) {
        *target = parse_value(key, &raw)?;
    }
    Ok(())
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(format!("invalid value for {}: '{}' ({})", key, raw, e)))
}
