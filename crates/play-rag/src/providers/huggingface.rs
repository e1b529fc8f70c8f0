//! Hugging Face token-classification provider for person names

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::EntityConfig;
use crate::error::{Error, Result};

use super::ner::{EntityRecognizer, EntitySpan};

/// Inference-endpoint NER client with grouped entities
pub struct HuggingFaceNer {
    client: Client,
    config: EntityConfig,
    api_token: Option<String>,
}

#[derive(Serialize)]
struct NerRequest<'a> {
    inputs: &'a str,
    parameters: NerParameters,
}

#[derive(Serialize)]
struct NerParameters {
    aggregation_strategy: &'static str,
}

impl HuggingFaceNer {
    /// Create a client; the token is read from the configured environment
    /// variable when present (self-hosted endpoints usually need none).
    pub fn new(config: &EntityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_token: std::env::var(&config.api_key_env).ok(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), self.config.model)
    }
}

#[async_trait]
impl EntityRecognizer for HuggingFaceNer {
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let mut request = self.client.post(self.endpoint()).json(&NerRequest {
            inputs: text,
            parameters: NerParameters {
                aggregation_strategy: "simple",
            },
        });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::upstream("entity annotation", format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(
                "entity annotation",
                format!("HTTP {} - {}", status, body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Error::upstream("entity annotation", format!("bad response: {}", e)))
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}
