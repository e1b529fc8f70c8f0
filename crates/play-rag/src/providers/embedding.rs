//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;
use crate::error::Result;

/// Which side of the retrieval pair a text is embedded for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingVariant {
    /// Stored content
    #[default]
    Document,
    /// Search queries, embedded with the model's query prompt
    Query,
}

/// Trait for generating text embeddings
///
/// Implementations must be deterministic for a fixed model version and
/// return one vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: &[String], variant: EmbeddingVariant) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()], EmbeddingVariant::Query).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::error::Error::upstream("embedding", "no vector returned for query"))
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
