//! Context assembly under a per-model token limit

use tiktoken_rs::CoreBPE;

use crate::error::{Error, Result};
use crate::types::{PromptView, RetrievalResult};

/// Counts model tokens in a piece of text
pub trait TokenEstimator: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// `cl100k_base` BPE, the encoding of the gpt-3.5 / gpt-4 family
pub struct Cl100kEstimator {
    bpe: CoreBPE,
}

impl Cl100kEstimator {
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| Error::internal(format!("failed to load cl100k_base: {}", e)))?;
        Ok(Self { bpe })
    }
}

impl TokenEstimator for Cl100kEstimator {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Select the prompt views of `results` that fit in `limit` tokens.
///
/// Candidates are taken in the order given. Each costs the token count of
/// its serialized prompt view. The first candidate that would push the
/// running total past `limit` ends the selection; later ones are dropped
/// even if they are smaller. A candidate that lands exactly on `limit` is
/// kept.
pub fn assemble_context(
    results: &[RetrievalResult],
    limit: usize,
    estimator: &dyn TokenEstimator,
) -> Result<Vec<PromptView>> {
    let mut used = 0;
    let mut included = Vec::new();

    for result in results {
        let view = result.prompt_view();
        let cost = estimator.count(&serde_json::to_string(&view)?);
        if used + cost > limit {
            tracing::debug!(
                "Context budget reached: kept {} of {} results ({} of {} tokens)",
                included.len(),
                results.len(),
                used,
                limit
            );
            break;
        }
        used += cost;
        included.push(view);
    }

    Ok(included)
}
