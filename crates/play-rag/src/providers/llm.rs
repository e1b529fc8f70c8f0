//! LLM provider trait for streamed answer generation

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// Incremental text fragments of one generation, in arrival order
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Trait for streaming chat generation
///
/// Failures may surface either when opening the stream or from any item
/// of the stream.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Start a generation for one system prompt and one user message
    async fn generate_stream(
        &self,
        system_prompt: &str,
        user_message: &str,
        model: &str,
    ) -> Result<FragmentStream>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
