//! Deterministic fake providers shared by unit tests

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Error, Result};
use crate::providers::{
    EmbeddingProvider, EmbeddingVariant, FragmentStream, GenerationProvider, RerankHit,
    RerankProvider,
};
use crate::types::Chunk;

/// Two acts of one scene each, wrapped in the default markers
pub fn toy_corpus() -> String {
    "The Project Gutenberg eBook of Romeo and Juliet\n\
     *** START OF THE PROJECT GUTENBERG EBOOK ROMEO AND JULIET ***\n\
     ACT I\n\nSCENE I. A public place.\n\nEnter Sampson and Gregory. Later Romeo walks alone.\n\n\
     ACT II\n\nSCENE I. Capulet's orchard.\n\nJuliet appears above at a window.\n\
     *** END OF THE PROJECT GUTENBERG EBOOK ROMEO AND JULIET ***\n\
     End of license."
        .to_string()
}

/// A chunk with placeholder counts
pub fn chunk(act: u32, scene: u32, text: &str) -> Chunk {
    Chunk {
        act,
        scene,
        num_words_in_act: 100 * act as usize,
        number_words_in_scene: 10 * scene as usize,
        possible_entities: BTreeSet::new(),
        chunk_text: text.to_string(),
    }
}

/// Bag-of-words embedder hashing lowercase words into `dimension` buckets
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % self.dimension as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, texts: &[String], _variant: EmbeddingVariant) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Reverses the candidate order, scoring the new first place highest
pub struct ReverseReranker;

#[async_trait]
impl RerankProvider for ReverseReranker {
    async fn rerank(&self, _query: &str, documents: &[String], top_n: usize) -> Result<Vec<RerankHit>> {
        let n = documents.len();
        Ok((0..n)
            .rev()
            .take(top_n)
            .enumerate()
            .map(|(rank, index)| RerankHit {
                index,
                relevance_score: 1.0 - rank as f32 / n as f32,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "reverse"
    }
}

/// How a scripted attempt fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Opening the stream fails
    OnOpen,
    /// The first fragment arrives, then the stream errors
    MidStream,
}

/// Generation provider failing a fixed number of attempts before succeeding
pub struct ScriptedGenerator {
    fragments: Vec<String>,
    failures: u32,
    mode: FailureMode,
    attempts: AtomicU32,
    last_system_prompt: Mutex<Option<String>>,
}

impl ScriptedGenerator {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            failures: 0,
            mode: FailureMode::OnOpen,
            attempts: AtomicU32::new(0),
            last_system_prompt: Mutex::new(None),
        }
    }

    /// Fail the first `failures` attempts
    pub fn failing_first(mut self, failures: u32, mode: FailureMode) -> Self {
        self.failures = failures;
        self.mode = mode;
        self
    }

    /// Never succeed
    pub fn always_failing(self) -> Self {
        self.failing_first(u32::MAX, FailureMode::OnOpen)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn last_system_prompt(&self) -> Option<String> {
        self.last_system_prompt.lock().clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    async fn generate_stream(
        &self,
        system_prompt: &str,
        _user_message: &str,
        _model: &str,
    ) -> Result<FragmentStream> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_system_prompt.lock() = Some(system_prompt.to_string());

        if attempt > self.failures {
            let items: Vec<Result<String>> = self.fragments.iter().cloned().map(Ok).collect();
            return Ok(Box::pin(stream::iter(items)));
        }

        let failure = Error::upstream("generation", format!("attempt {} refused", attempt));
        match self.mode {
            FailureMode::OnOpen => Err(failure),
            FailureMode::MidStream => {
                let mut items: Vec<Result<String>> =
                    self.fragments.iter().take(1).cloned().map(Ok).collect();
                items.push(Err(failure));
                Ok(Box::pin(stream::iter(items)))
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
