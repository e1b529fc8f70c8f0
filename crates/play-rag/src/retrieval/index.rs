//! Flat inner-product index over unit-normalized embeddings

use ndarray::{Array2, ArrayView1};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, EmbeddingVariant, RerankProvider};
use crate::types::{Chunk, IndexedEntry, RetrievalResult, SearchQuery};

/// Vectors and their entries, row `i` of `vectors` belonging to `entries[i]`
struct Store {
    vectors: Option<Array2<f32>>,
    entries: Vec<IndexedEntry>,
}

impl Store {
    fn dimension(&self) -> Option<usize> {
        self.vectors.as_ref().map(|v| v.ncols())
    }

    /// Append normalized rows; all-or-nothing on dimension errors
    fn append(&mut self, entries: Vec<IndexedEntry>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        let Some(first) = embeddings.first() else {
            return Ok(());
        };
        let expected = self.dimension().unwrap_or(first.len());
        if expected == 0 {
            return Err(Error::upstream("embedding", "empty embedding vector"));
        }
        if let Some(bad) = embeddings.iter().find(|v| v.len() != expected) {
            return Err(Error::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        let vectors = self
            .vectors
            .get_or_insert_with(|| Array2::zeros((0, expected)));
        for mut embedding in embeddings {
            normalize(&mut embedding);
            vectors
                .push_row(ArrayView1::from(&embedding))
                .map_err(|e| Error::internal(format!("index append failed: {}", e)))?;
        }
        self.entries.extend(entries);

        Ok(())
    }

    /// Top `k` entries by descending inner product with `query`
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        let Some(vectors) = &self.vectors else {
            return Err(Error::NotReady);
        };
        if query.len() != vectors.ncols() {
            return Err(Error::DimensionMismatch {
                expected: vectors.ncols(),
                actual: query.len(),
            });
        }

        let scores = vectors.dot(&ArrayView1::from(query));
        let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .map(|(row, score)| RetrievalResult {
                metadata: self.entries[row].clone(),
                distance: 1.0 - score,
                relevance_score: None,
            })
            .collect())
    }
}

/// L2-normalize in place; zero vectors are left unchanged
fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Shared, growable vector index.
///
/// Queries run concurrently under a read lock; inserts take the write lock
/// only to append, after embedding has finished. Search and append run on
/// the blocking pool.
#[derive(Clone)]
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    reranker: Option<Arc<dyn RerankProvider>>,
    store: Arc<RwLock<Store>>,
}

impl VectorIndex {
    /// Create an empty index
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Option<Arc<dyn RerankProvider>>,
    ) -> Self {
        Self {
            embedder,
            reranker,
            store: Arc::new(RwLock::new(Store {
                vectors: None,
                entries: Vec::new(),
            })),
        }
    }

    /// Whether any entry has been inserted
    pub fn has_content(&self) -> bool {
        !self.store.read().entries.is_empty()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.store.read().entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        !self.has_content()
    }

    /// Embedding dimension, fixed by the first insert
    pub fn dimension(&self) -> Option<usize> {
        self.store.read().dimension()
    }

    /// Whether reranking requests can be served
    pub fn can_rerank(&self) -> bool {
        self.reranker.is_some()
    }

    /// Embed and append chunks. Entries accumulate across calls.
    pub async fn insert(&self, chunks: Vec<Chunk>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let entries: Vec<IndexedEntry> = chunks.into_iter().map(IndexedEntry::new).collect();
        let texts: Vec<String> = entries.iter().map(|e| e.stringified_input.clone()).collect();

        let embeddings = self.embedder.embed(&texts, EmbeddingVariant::Document).await?;
        if embeddings.len() != entries.len() {
            return Err(Error::upstream(
                "embedding",
                format!("expected {} vectors, got {}", entries.len(), embeddings.len()),
            ));
        }

        let store = Arc::clone(&self.store);
        let count = entries.len();
        tokio::task::spawn_blocking(move || store.write().append(entries, embeddings))
            .await
            .map_err(|e| Error::internal(format!("insert task failed: {}", e)))??;

        tracing::debug!("Inserted {} entries with {}", count, self.embedder.name());
        Ok(())
    }

    /// Nearest entries to the query text, post-filtered by act and scene and
    /// optionally reranked.
    ///
    /// Filters apply after the `top_k` search, so fewer than `top_k` results
    /// may come back.
    pub async fn query(&self, query: &SearchQuery) -> Result<Vec<RetrievalResult>> {
        if !self.has_content() {
            return Err(Error::NotReady);
        }
        let reranker = match (&self.reranker, query.use_reranking) {
            (Some(reranker), true) => Some(Arc::clone(reranker)),
            (None, true) => {
                return Err(Error::config("reranking requested but no reranker is configured"))
            }
            (_, false) => None,
        };

        let mut embedding = self.embedder.embed_query(&query.query_text).await?;
        normalize(&mut embedding);

        let store = Arc::clone(&self.store);
        let top_k = query.top_k;
        let candidates = tokio::task::spawn_blocking(move || store.read().search(&embedding, top_k))
            .await
            .map_err(|e| Error::internal(format!("search task failed: {}", e)))??;

        let results: Vec<RetrievalResult> = candidates
            .into_iter()
            .filter(|r| query.filter_act.map_or(true, |act| r.metadata.chunk.act == act))
            .filter(|r| query.filter_scene.map_or(true, |scene| r.metadata.chunk.scene == scene))
            .collect();

        tracing::debug!(
            "Query matched {} results (top_k={}, act={:?}, scene={:?})",
            results.len(),
            query.top_k,
            query.filter_act,
            query.filter_scene
        );

        match reranker {
            Some(reranker) => rerank(reranker.as_ref(), &query.query_text, results).await,
            None => Ok(results),
        }
    }
}

/// Reorder results to the reranker's output, attaching relevance scores
async fn rerank(
    reranker: &dyn RerankProvider,
    query_text: &str,
    results: Vec<RetrievalResult>,
) -> Result<Vec<RetrievalResult>> {
    if results.is_empty() {
        return Ok(results);
    }

    let documents: Vec<String> = results
        .iter()
        .map(|r| r.metadata.stringified_input.clone())
        .collect();
    let hits = reranker.rerank(query_text, &documents, documents.len()).await?;

    hits.into_iter()
        .map(|hit| {
            let mut result = results.get(hit.index).cloned().ok_or_else(|| {
                Error::upstream(
                    "reranking",
                    format!("index {} out of range for {} documents", hit.index, results.len()),
                )
            })?;
            result.relevance_score = Some(hit.relevance_score);
            Ok(result)
        })
        .collect()
}
