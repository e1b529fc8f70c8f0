//! In-memory vector index with filtered, optionally reranked search

mod index;

pub use index::VectorIndex;
