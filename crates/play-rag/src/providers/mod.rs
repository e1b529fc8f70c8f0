//! Capability abstractions for embeddings, reranking, generation and entity
//! recognition, with HTTP-backed implementations.

pub mod cohere;
pub mod embedding;
pub mod huggingface;
pub mod llm;
pub mod ner;
pub mod ollama;
pub mod openai;
pub mod rerank;

pub use embedding::{EmbeddingProvider, EmbeddingVariant};
pub use llm::{FragmentStream, GenerationProvider};
pub use ner::{EntityRecognizer, EntitySpan};
pub use rerank::{RerankHit, RerankProvider};
