//! Retrieval results and their prompt projection

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::chunk::IndexedEntry;

/// A ranked hit from the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The stored entry that matched
    pub metadata: IndexedEntry,
    /// Cosine distance to the query (`1 - inner product`), lower is closer
    pub distance: f32,
    /// Reranker relevance, present only when reranking was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
}

impl RetrievalResult {
    /// Projection used inside the system prompt
    pub fn prompt_view(&self) -> PromptView {
        let chunk = &self.metadata.chunk;
        PromptView {
            metadata: PromptMetadata {
                act: chunk.act,
                scene: chunk.scene,
                num_words_in_act: chunk.num_words_in_act,
                number_words_in_scene: chunk.number_words_in_scene,
                possible_entities: chunk.possible_entities.clone(),
                chunk_text: chunk.chunk_text.clone(),
            },
            distance: self.distance,
            relevance_score: self.relevance_score,
        }
    }
}

/// A retrieval result as shown to the model.
///
/// Leaves out the serialized embedding input, which duplicates the
/// structured fields. `chunk_text` stays: it is the only copy of the
/// passage wording the model sees, and it lives on the chunk rather than
/// under a separate `text` key. The stored entry is not modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptView {
    pub metadata: PromptMetadata,
    pub distance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
}

/// Chunk fields carried into the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMetadata {
    pub act: u32,
    pub scene: u32,
    pub num_words_in_act: usize,
    pub number_words_in_scene: usize,
    pub possible_entities: BTreeSet<String>,
    pub chunk_text: String,
}
