//! Bounded retry with capped exponential backoff

use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::Error;

/// Result of one generation attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The stream ran to completion
    Succeeded,
    /// The attempt failed in a way worth retrying
    Retryable(Error),
    /// The attempt failed in a way retrying cannot fix
    Fatal(Error),
}

impl AttemptOutcome {
    /// Classify a failed attempt by its error
    pub fn from_error(error: Error) -> Self {
        if error.is_retryable() {
            Self::Retryable(error)
        } else {
            Self::Fatal(error)
        }
    }
}

/// What to do after an attempt
#[derive(Debug)]
pub enum RetryStep {
    /// Stop, the answer is complete
    Finish,
    /// Sleep for `delay` and start over from the beginning
    Retry {
        attempt: u32,
        delay: Duration,
        error: Error,
    },
    /// Stop with a terminal error
    Fail(Error),
}

/// Attempt limit and backoff shape
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Cap on a single sleep, in units
    pub max_backoff_units: u64,
    /// Length of one unit
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            max_backoff_units: config.max_backoff_units,
            unit: Duration::from_millis(config.backoff_unit_ms),
        }
    }

    /// Sleep after the `attempt`-th failure: `min(cap, 2^attempt)` units
    pub fn backoff(&self, attempt: u32) -> Duration {
        let units = 1u64
            .checked_shl(attempt)
            .unwrap_or(u64::MAX)
            .min(self.max_backoff_units);
        self.unit.saturating_mul(units.min(u32::MAX as u64) as u32)
    }
}

/// Per-invocation state machine: `Attempting → Success`, or
/// `Attempting → Retrying → … → Failed` once attempts run out.
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    failures: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            failures: 0,
        }
    }

    /// Failed attempts so far
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Advance on the outcome of the latest attempt
    pub fn advance(&mut self, outcome: AttemptOutcome) -> RetryStep {
        match outcome {
            AttemptOutcome::Succeeded => RetryStep::Finish,
            AttemptOutcome::Fatal(error) => {
                self.failures += 1;
                RetryStep::Fail(error)
            }
            AttemptOutcome::Retryable(error) => {
                self.failures += 1;
                if self.failures >= self.policy.max_attempts {
                    RetryStep::Fail(Error::ExhaustedRetries {
                        attempts: self.failures,
                        last_error: error.to_string(),
                    })
                } else {
                    RetryStep::Retry {
                        attempt: self.failures,
                        delay: self.policy.backoff(self.failures),
                        error,
                    }
                }
            }
        }
    }
}
