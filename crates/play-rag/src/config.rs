//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ingestion::SegmenterConfig;

/// Main RAG system configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Corpus location and structural markers
    pub corpus: CorpusConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Reranking configuration (reranking requests fail without it)
    pub reranker: Option<RerankerConfig>,
    /// Entity annotation configuration (annotation is skipped without it)
    pub entities: Option<EntityConfig>,
    /// Generation configuration
    pub llm: LlmConfig,
    /// System prompt configuration
    pub prompt: PromptConfig,
    /// Per-model context limits, in tokens
    pub models: ModelLimits,
}

impl RagConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Corpus source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Path to the UTF-8 corpus text
    pub path: PathBuf,
    /// Structural markers used by the segmenter
    #[serde(flatten)]
    pub segmenter: SegmenterConfig,
    /// Concurrent entity annotation requests during ingestion
    pub annotation_concurrency: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/corpus.txt"),
            segmenter: SegmenterConfig::default(),
            annotation_concurrency: 4,
        }
    }
}

/// Embedding configuration (Ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Prefix prepended to query-variant inputs
    pub query_prefix: String,
    /// Maximum texts per embedding request
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "snowflake-arctic-embed:m-long".to_string(),
            query_prefix: "Represent this sentence for searching relevant passages: "
                .to_string(),
            batch_size: 32,
            timeout_secs: 120,
        }
    }
}

/// Reranking configuration (Cohere)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    /// Cohere API base URL
    pub base_url: String,
    /// Rerank model
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cohere.com".to_string(),
            model: "rerank-english-v3.0".to_string(),
            api_key_env: "COHERE_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Named-entity recognition configuration (Hugging Face token classification)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Inference endpoint base URL; the model name is appended
    pub base_url: String,
    /// Token classification model
    pub model: String,
    /// Entity group kept by the annotator
    pub label: String,
    /// Spans scored below this confidence are dropped
    pub min_score: f32,
    /// Environment variable holding the API token
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "Davlan/distilbert-base-multilingual-cased-ner-hrl".to_string(),
            label: "PER".to_string(),
            min_score: 0.0,
            api_key_env: "HF_API_TOKEN".to_string(),
            timeout_secs: 60,
        }
    }
}

/// LLM (OpenAI-compatible) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Total attempts per generation, including the first
    pub max_attempts: u32,
    /// Upper bound on a single backoff sleep, in backoff units
    pub max_backoff_units: u64,
    /// Length of one backoff unit in milliseconds
    pub backoff_unit_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
            max_attempts: 5,
            max_backoff_units: 30,
            backoff_unit_ms: 1000,
        }
    }
}

/// System prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptConfig {
    /// Template file overriding the bundled question-answering prompt
    pub template_path: Option<PathBuf>,
}

/// Model identifier → maximum context length, in tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ModelLimits(pub BTreeMap<String, usize>);

impl Default for ModelLimits {
    fn default() -> Self {
        let mut limits = BTreeMap::new();
        limits.insert("gpt-3.5-turbo-16k".to_string(), 8192);
        limits.insert("gpt-4".to_string(), 4192);
        Self(limits)
    }
}

impl ModelLimits {
    /// Context limit for a model, if known
    pub fn limit_for(&self, model: &str) -> Option<usize> {
        self.0.get(model).copied()
    }
}

/// Whether a `LOCAL_LOGGING` value selects the developer log format.
///
/// Any integer other than zero turns it on.
pub fn local_logging_enabled(value: Option<&str>) -> bool {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .is_some_and(|v| v != 0)
}
