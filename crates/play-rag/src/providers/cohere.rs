//! Cohere rerank provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RerankerConfig;
use crate::error::{Error, Result};

use super::rerank::{RerankHit, RerankProvider};

/// Cohere `/v1/rerank` client
pub struct CohereReranker {
    client: Client,
    config: RerankerConfig,
    api_key: String,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

impl CohereReranker {
    /// Create a reranker with an explicit API key
    pub fn new(config: &RerankerConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.into(),
        })
    }

    /// Create a reranker reading its key from the configured environment variable
    pub fn from_env(config: &RerankerConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            Error::config(format!(
                "reranker configured but {} is not set",
                config.api_key_env
            ))
        })?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl RerankProvider for CohereReranker {
    async fn rerank(&self, query: &str, documents: &[String], top_n: usize) -> Result<Vec<RerankHit>> {
        let url = format!("{}/v1/rerank", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&RerankRequest {
                model: &self.config.model,
                query,
                documents,
                top_n,
            })
            .send()
            .await
            .map_err(|e| Error::upstream("reranking", format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream("reranking", format!("HTTP {} - {}", status, body)));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream("reranking", format!("bad response: {}", e)))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| RerankHit {
                index: r.index,
                relevance_score: r.relevance_score,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "cohere"
    }
}
