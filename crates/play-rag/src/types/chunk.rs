//! Chunk types produced by segmentation and stored by the index

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A block of the play, positioned by act and scene.
///
/// Chunks are produced once, in document order, by the segmenter and are
/// never mutated after annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Act number (1-based)
    pub act: u32,
    /// Scene number within the act (1-based)
    pub scene: u32,
    /// Sum of the word counts of every scene in this act
    pub num_words_in_act: usize,
    /// Word count of the scene this block belongs to
    pub number_words_in_scene: usize,
    /// Person names found in the block
    pub possible_entities: BTreeSet<String>,
    /// The block text, ending with its stage direction when it has one
    pub chunk_text: String,
}

impl Chunk {
    /// Deterministic text form used for embedding and reranking.
    ///
    /// Every structural field is rendered as `key: value`, joined by `, `,
    /// with the raw block text appended last as `text: <chunk_text>`.
    pub fn stringify(&self) -> String {
        let entities = self
            .possible_entities
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "act: {}, scene: {}, num_words_in_act: {}, number_words_in_scene: {}, possible_entities: [{}], text: {}",
            self.act,
            self.scene,
            self.num_words_in_act,
            self.number_words_in_scene,
            entities,
            self.chunk_text
        )
    }
}

/// A chunk as stored in the vector index, with its serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedEntry {
    /// The originating chunk
    #[serde(flatten)]
    pub chunk: Chunk,
    /// `Chunk::stringify` output, the text that was embedded
    pub stringified_input: String,
}

impl IndexedEntry {
    /// Wrap a chunk, deriving its serialized form
    pub fn new(chunk: Chunk) -> Self {
        let stringified_input = chunk.stringify();
        Self {
            chunk,
            stringified_input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk() -> Chunk {
        Chunk {
            act: 2,
            scene: 3,
            num_words_in_act: 900,
            number_words_in_scene: 120,
            possible_entities: ["Romeo", "Friar Laurence"]
                .into_iter()
                .map(String::from)
                .collect(),
            chunk_text: "Enter Romeo. [_Exit._]".to_string(),
        }
    }

    #[test]
    fn test_stringify_puts_text_last() {
        let s = chunk().stringify();
        assert_eq!(
            s,
            "act: 2, scene: 3, num_words_in_act: 900, number_words_in_scene: 120, \
             possible_entities: [Friar Laurence, Romeo], text: Enter Romeo. [_Exit._]"
        );
    }

    #[test]
    fn test_stringify_is_deterministic() {
        let a = chunk();
        let mut b = chunk();
        b.possible_entities = ["Friar Laurence", "Romeo"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(a.stringify(), b.stringify());
    }

    #[test]
    fn test_indexed_entry_serializes_flat() {
        let entry = IndexedEntry::new(chunk());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["act"], 2);
        assert_eq!(value["stringified_input"], entry.stringified_input.as_str());
    }
}
