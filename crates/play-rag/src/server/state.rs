//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{Cl100kEstimator, Generator, PromptTemplate, RetryPolicy};
use crate::providers::{
    cohere::CohereReranker, ollama::OllamaEmbedder, openai::OpenAiClient, RerankProvider,
};
use crate::retrieval::VectorIndex;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Shared vector index
    index: VectorIndex,
    /// Answer generator
    generator: Generator,
}

impl AppState {
    /// Wire up providers from configuration.
    ///
    /// Credentials are read from the environment variables named in the
    /// config; a configured reranker without its key is an error.
    pub fn from_config(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG application state...");

        let embedder = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
        tracing::info!(
            "Embeddings: {} at {}",
            config.embeddings.model,
            config.embeddings.base_url
        );

        let reranker: Option<Arc<dyn RerankProvider>> = match &config.reranker {
            Some(reranker) => {
                tracing::info!("Reranking: {}", reranker.model);
                Some(Arc::new(CohereReranker::from_env(reranker)?))
            }
            None => {
                tracing::info!("Reranking disabled");
                None
            }
        };

        let index = VectorIndex::new(embedder, reranker);

        let generator = Generator::new(
            Arc::new(OpenAiClient::from_env(&config.llm)?),
            PromptTemplate::from_config(&config.prompt)?,
            config.models.clone(),
            Arc::new(Cl100kEstimator::new()?),
            RetryPolicy::from_config(&config.llm),
        );
        tracing::info!(
            "Generation: {} (max {} attempts)",
            config.llm.base_url,
            config.llm.max_attempts
        );

        Ok(Self::new(config, index, generator))
    }

    /// Build state from already constructed components
    pub fn new(config: RagConfig, index: VectorIndex, generator: Generator) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                generator,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the vector index
    pub fn index(&self) -> &VectorIndex {
        &self.inner.index
    }

    /// Get the answer generator
    pub fn generator(&self) -> &Generator {
        &self.inner.generator
    }

    /// Ready once the corpus has been indexed
    pub fn is_ready(&self) -> bool {
        self.inner.index.has_content()
    }
}
