//! Answer generation: token-budgeted context, prompt templating and
//! retried streaming

mod budget;
mod orchestrator;
mod prompt;
mod retry;

pub use budget::{assemble_context, Cl100kEstimator, TokenEstimator};
pub use orchestrator::{collect_answer, AnswerStream, Generator};
pub use prompt::PromptTemplate;
pub use retry::{AttemptOutcome, RetryPolicy, RetryState, RetryStep};
