//! Named-entity recognition trait

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// A grouped entity found in a text
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntitySpan {
    /// Surface text of the entity
    pub word: String,
    /// Entity type label (e.g. `PER`, `LOC`)
    pub entity_group: String,
    /// Model confidence
    #[serde(default)]
    pub score: f32,
}

/// Trait for token-classification backends
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Find grouped entities in `text`
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
