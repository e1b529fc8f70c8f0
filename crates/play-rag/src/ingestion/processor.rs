//! Ingestion pipeline: segment, annotate, index

use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{huggingface::HuggingFaceNer, EntityRecognizer};
use crate::retrieval::VectorIndex;
use crate::types::Chunk;

use super::entities::EntityAnnotator;
use super::segmenter::Segmenter;

/// Turns raw corpus text into annotated chunks and loads them into an index
pub struct IngestPipeline {
    segmenter: Segmenter,
    annotator: EntityAnnotator,
    concurrency: usize,
}

impl IngestPipeline {
    /// Create a new pipeline; `concurrency` bounds in-flight annotation calls
    pub fn new(segmenter: Segmenter, annotator: EntityAnnotator, concurrency: usize) -> Self {
        Self {
            segmenter,
            annotator,
            concurrency: concurrency.max(1),
        }
    }

    /// Build the pipeline described by the corpus and entity sections
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let segmenter = Segmenter::new(config.corpus.segmenter.clone())?;
        let annotator = match &config.entities {
            Some(entities) => {
                tracing::info!("Entity annotation enabled ({})", entities.model);
                let recognizer: Arc<dyn EntityRecognizer> = Arc::new(HuggingFaceNer::new(entities)?);
                EntityAnnotator::new(Some(recognizer), &entities.label)
                    .with_min_score(entities.min_score)
            }
            None => EntityAnnotator::disabled(),
        };
        Ok(Self::new(segmenter, annotator, config.corpus.annotation_concurrency))
    }

    /// Segment and annotate a corpus, preserving document order
    pub async fn process(&self, raw_text: &str) -> Result<Vec<Chunk>> {
        let corpus = self.segmenter.segment(raw_text)?;
        if let Some(preamble) = &corpus.preamble {
            tracing::debug!("Skipped {} bytes of preamble", preamble.len());
        }
        if !corpus.skipped_acts.is_empty() {
            let bytes: usize = corpus.skipped_acts.iter().map(|(_, b)| b).sum();
            tracing::info!(
                "Dropped {} act segments without scene headings ({} bytes)",
                corpus.skipped_acts.len(),
                bytes
            );
        }

        if !self.annotator.is_enabled() {
            return Ok(corpus.chunks);
        }

        // buffered (not buffer_unordered) keeps emission order
        let chunks: Vec<Chunk> = stream::iter(corpus.chunks)
            .map(|mut chunk| async move {
                chunk.possible_entities = self.annotator.annotate(&chunk.chunk_text).await?;
                Ok::<_, Error>(chunk)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let tagged = chunks.iter().filter(|c| !c.possible_entities.is_empty()).count();
        tracing::info!("Annotated {} chunks ({} mention people)", chunks.len(), tagged);

        Ok(chunks)
    }

    /// Process a corpus and insert every chunk into `index`.
    ///
    /// Nothing is inserted unless the whole corpus segments and annotates.
    pub async fn ingest_into(&self, index: &VectorIndex, raw_text: &str) -> Result<usize> {
        let chunks = self.process(raw_text).await?;
        let count = chunks.len();
        index.insert(chunks).await?;
        tracing::info!("Indexed {} chunks ({} entries total)", count, index.len());
        Ok(count)
    }

    /// Read a corpus file and ingest it
    pub async fn ingest_file(&self, index: &VectorIndex, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        tracing::info!("Reading corpus from {}", path.display());
        let raw_text = tokio::fs::read_to_string(path).await?;
        self.ingest_into(index, &raw_text).await
    }
}
