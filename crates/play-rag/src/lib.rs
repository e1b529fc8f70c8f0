//! play-rag: question answering over a structured play
//!
//! The corpus is segmented into act/scene/stage-direction blocks, optionally
//! annotated with the people each block mentions, embedded into an in-memory
//! inner-product index, and served over HTTP. Answers are generated from a
//! token-budgeted selection of retrieved blocks and streamed back as they
//! arrive, with bounded retry around the model call.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::Generator;
pub use ingestion::{IngestPipeline, Segmenter};
pub use retrieval::VectorIndex;
pub use types::{Chunk, RagRequest, RetrievalResult, SearchQuery};
