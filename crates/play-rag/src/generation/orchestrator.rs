//! Streamed answer generation with retry

use bytes::Bytes;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::Arc;

use crate::config::ModelLimits;
use crate::error::{Error, Result};
use crate::providers::GenerationProvider;
use crate::types::{ModelId, RetrievalResult};

use super::budget::{assemble_context, TokenEstimator};
use super::prompt::PromptTemplate;
use super::retry::{AttemptOutcome, RetryPolicy, RetryState, RetryStep};

/// UTF-8 answer fragments in arrival order.
///
/// Ends with an `Err` item when generation fails for good.
pub type AnswerStream = BoxStream<'static, Result<Bytes>>;

/// Builds the grounded system prompt and streams the model's answer
pub struct Generator {
    provider: Arc<dyn GenerationProvider>,
    template: PromptTemplate,
    limits: ModelLimits,
    estimator: Arc<dyn TokenEstimator>,
    policy: RetryPolicy,
}

impl Generator {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        template: PromptTemplate,
        limits: ModelLimits,
        estimator: Arc<dyn TokenEstimator>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            template,
            limits,
            estimator,
            policy,
        }
    }

    /// System prompt holding as many results as fit the model's context
    pub fn system_prompt(&self, results: &[RetrievalResult], model: ModelId) -> Result<String> {
        let limit = self
            .limits
            .limit_for(model.as_str())
            .ok_or_else(|| Error::config(format!("no context limit configured for {}", model)))?;

        let views = assemble_context(results, limit, self.estimator.as_ref())?;
        let corpus = serde_json::to_string(&views)?;
        Ok(self.template.render(&corpus))
    }

    /// Stream an answer to `query_text` grounded in `results`.
    ///
    /// Each fragment is forwarded as soon as it arrives. A failed attempt is
    /// retried from the start after a backoff sleep, so fragments of the
    /// failed attempt may precede those of the retry. Dropping the stream
    /// cancels the in-flight call or sleep.
    pub fn generate(
        &self,
        query_text: &str,
        results: &[RetrievalResult],
        model: ModelId,
    ) -> Result<AnswerStream> {
        let system_prompt = self.system_prompt(results, model)?;
        let user_message = query_text.to_string();
        let provider = Arc::clone(&self.provider);
        let policy = self.policy.clone();
        let model = model.as_str();

        let stream = async_stream::try_stream! {
            let mut state = RetryState::new(policy);

            loop {
                let outcome = match provider.generate_stream(&system_prompt, &user_message, model).await {
                    Err(e) => AttemptOutcome::from_error(e),
                    Ok(mut fragments) => {
                        let mut failure = None;
                        while let Some(item) = fragments.next().await {
                            match item {
                                Ok(fragment) => yield Bytes::from(fragment),
                                Err(e) => {
                                    failure = Some(e);
                                    break;
                                }
                            }
                        }
                        failure.map_or(AttemptOutcome::Succeeded, AttemptOutcome::from_error)
                    }
                };

                match state.advance(outcome) {
                    RetryStep::Finish => break,
                    RetryStep::Retry { attempt, delay, error } => {
                        tracing::warn!(
                            "Generation attempt {} with {} failed: {}. Retrying in {:?}",
                            attempt,
                            provider.name(),
                            error,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryStep::Fail(error) => {
                        tracing::error!(
                            "Generation with {} failed after {} attempts: {}",
                            provider.name(),
                            state.failures(),
                            error
                        );
                        Err::<(), Error>(error)?;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Drain an answer stream into one string
pub async fn collect_answer(mut stream: AnswerStream) -> Result<String> {
    let mut answer = Vec::new();
    while let Some(fragment) = stream.next().await {
        answer.extend_from_slice(&fragment?);
    }
    String::from_utf8(answer).map_err(|e| Error::upstream("generation", format!("answer is not UTF-8: {}", e)))
}
