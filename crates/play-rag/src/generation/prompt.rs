//! System prompt template with a single `{corpus}` substitution point

use std::path::Path;

use crate::config::PromptConfig;
use crate::error::{Error, Result};

const CORPUS_SLOT: &str = "{corpus}";
const BUNDLED: &str = include_str!("../../prompts/question_answer.txt");

/// The question-answering system prompt
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Wrap template text; it must contain exactly one `{corpus}` slot
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        match text.matches(CORPUS_SLOT).count() {
            1 => Ok(Self { text }),
            n => Err(Error::config(format!(
                "prompt template needs exactly one {} slot, found {}",
                CORPUS_SLOT, n
            ))),
        }
    }

    /// The prompt shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::new(BUNDLED)
    }

    /// Load a template from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(std::fs::read_to_string(path)?)
    }

    /// The configured override, or the bundled prompt
    pub fn from_config(config: &PromptConfig) -> Result<Self> {
        match &config.template_path {
            Some(path) => {
                tracing::info!("Loading system prompt from {}", path.display());
                Self::from_file(path)
            }
            None => Self::bundled(),
        }
    }

    /// Substitute the retrieved context
    pub fn render(&self, corpus: &str) -> String {
        self.text.replacen(CORPUS_SLOT, corpus, 1)
    }
}
