//! Ollama embedding provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::embedding::{EmbeddingProvider, EmbeddingVariant};

/// Ollama embedder using the batch `/api/embed` endpoint
pub struct OllamaEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Apply the variant's prompt to an input text
    fn prepare(&self, text: &str, variant: EmbeddingVariant) -> String {
        match variant {
            EmbeddingVariant::Document => text.to_string(),
            EmbeddingVariant::Query => format!("{}{}", self.config.query_prefix, text),
        }
    }

    async fn embed_batch(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.config.base_url);
        let expected = input.len();

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.config.model,
                input,
            })
            .send()
            .await
            .map_err(|e| Error::upstream("embedding", format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(
                "embedding",
                format!("HTTP {} - {}", status, body),
            ));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream("embedding", format!("bad response: {}", e)))?;

        if parsed.embeddings.len() != expected {
            return Err(Error::upstream(
                "embedding",
                format!("asked for {} vectors, got {}", expected, parsed.embeddings.len()),
            ));
        }

        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, texts: &[String], variant: EmbeddingVariant) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            let input = batch.iter().map(|t| self.prepare(t, variant)).collect();
            embeddings.extend(self.embed_batch(input).await?);
        }

        tracing::debug!("Embedded {} texts with {}", embeddings.len(), self.config.model);
        Ok(embeddings)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_variant_gets_prefix() {
        let config = EmbeddingConfig {
            query_prefix: "query: ".to_string(),
            ..EmbeddingConfig::default()
        };
        let embedder = OllamaEmbedder::new(&config).unwrap();

        assert_eq!(embedder.prepare("Who is Mercutio?", EmbeddingVariant::Query), "query: Who is Mercutio?");
        assert_eq!(embedder.prepare("act: 1", EmbeddingVariant::Document), "act: 1");
    }
}
