//! Reranking provider trait

use async_trait::async_trait;
use crate::error::Result;

/// One reranked document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankHit {
    /// Position of the document in the input list
    pub index: usize,
    /// Relevance of the document to the query, higher is better
    pub relevance_score: f32,
}

/// Trait for second-pass relevance ordering
#[async_trait]
pub trait RerankProvider: Send + Sync {
    /// Order `documents` by relevance to `query`, returning at most `top_n` hits
    /// with the most relevant first.
    async fn rerank(&self, query: &str, documents: &[String], top_n: usize) -> Result<Vec<RerankHit>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
