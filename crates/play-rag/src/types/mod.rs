//! Core types for the RAG system

pub mod chunk;
pub mod query;
pub mod response;

pub use chunk::{Chunk, IndexedEntry};
pub use query::{EmbeddingOptions, GenerationOptions, ModelId, RagRequest, SearchQuery};
pub use response::{PromptView, RetrievalResult};
