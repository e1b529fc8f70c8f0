//! Inbound request types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Generation models the service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ModelId {
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[default]
    #[serde(rename = "gpt-3.5-turbo-16k")]
    Gpt35Turbo16k,
}

impl ModelId {
    /// Wire name of the model
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt4 => "gpt-4",
            ModelId::Gpt35Turbo16k => "gpt-3.5-turbo-16k",
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieval options of a chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingOptions {
    /// Number of nearest neighbours to fetch
    #[serde(default = "default_top_k", alias = "TopKResponses")]
    pub top_k: usize,
    /// Reorder candidates with the reranking capability
    #[serde(default, alias = "UseReRanking")]
    pub use_reranking: bool,
    /// Keep only results from this act
    #[serde(default, alias = "FilteringActNumber")]
    pub filter_act: Option<u32>,
    /// Keep only results from this scene
    #[serde(default, alias = "FilteringSceneNumber")]
    pub filter_scene: Option<u32>,
}

fn default_top_k() -> usize {
    5
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            use_reranking: false,
            filter_act: None,
            filter_scene: None,
        }
    }
}

/// Generation options of a chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model that writes the answer
    #[serde(default, alias = "InferenceModel")]
    pub model_id: ModelId,
    /// Stream fragments as they arrive instead of returning the whole answer
    #[serde(default = "default_return_stream", alias = "ReturnStream")]
    pub return_stream: bool,
}

fn default_return_stream() -> bool {
    true
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model_id: ModelId::default(),
            return_stream: true,
        }
    }
}

/// `POST /chat` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagRequest {
    /// The question to answer
    #[serde(alias = "Query")]
    pub query: String,
    #[serde(default, alias = "EmbeddingMetaData")]
    pub embedding_options: EmbeddingOptions,
    #[serde(default, alias = "LLMGenerationMetaData")]
    pub generation_options: GenerationOptions,
}

impl RagRequest {
    /// Create a request with default options
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            embedding_options: EmbeddingOptions::default(),
            generation_options: GenerationOptions::default(),
        }
    }

    /// Reject requests the core cannot serve
    pub fn validate(&self) -> Result<()> {
        if self.embedding_options.top_k == 0 {
            return Err(Error::InvalidRequest("top_k must be at least 1".to_string()));
        }
        Ok(())
    }

    /// The retrieval half of the request
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            query_text: self.query.clone(),
            top_k: self.embedding_options.top_k,
            use_reranking: self.embedding_options.use_reranking,
            filter_act: self.embedding_options.filter_act,
            filter_scene: self.embedding_options.filter_scene,
        }
    }
}

/// A single nearest-neighbour lookup against the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query_text: String,
    pub top_k: usize,
    pub use_reranking: bool,
    pub filter_act: Option<u32>,
    pub filter_scene: Option<u32>,
}

impl SearchQuery {
    /// Create an unfiltered query without reranking
    pub fn new(query_text: impl Into<String>, top_k: usize) -> Self {
        Self {
            query_text: query_text.into(),
            top_k,
            use_reranking: false,
            filter_act: None,
            filter_scene: None,
        }
    }

    /// Keep only results from `act`
    pub fn with_act(mut self, act: u32) -> Self {
        self.filter_act = Some(act);
        self
    }

    /// Keep only results from `scene`
    pub fn with_scene(mut self, scene: u32) -> Self {
        self.filter_scene = Some(scene);
        self
    }

    /// Rerank candidates before returning them
    pub fn with_reranking(mut self) -> Self {
        self.use_reranking = true;
        self
    }
}
