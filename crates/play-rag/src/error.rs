//! Error types for the RAG system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed corpus structure
    #[error("Corpus parse error: {0}")]
    Parse(String),

    /// A requested feature lacks the capability it needs
    #[error("Configuration error: {0}")]
    Config(String),

    /// Query issued before anything was inserted
    #[error("Index has not been built, put content in before searching")]
    NotReady,

    /// Embedding dimensionality changed between insertions
    #[error("Embedding dimension mismatch: index holds {expected}-d vectors, got {actual}-d")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding, annotation, reranking or generation backend failure
    #[error("{capability} failed: {message}")]
    Upstream {
        capability: &'static str,
        message: String,
    },

    /// Generation gave up after the maximum number of attempts
    #[error("Generation failed after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    /// Request failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error
    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a corpus parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an upstream capability error
    pub fn upstream(capability: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            capability,
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a generation attempt that failed with this error may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Upstream { .. } | Error::Http(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Parse(_) => (StatusCode::INTERNAL_SERVER_ERROR, "parse_error"),
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::NotReady => (StatusCode::SERVICE_UNAVAILABLE, "not_ready"),
            Error::DimensionMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "dimension_mismatch")
            }
            Error::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            Error::ExhaustedRetries { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "exhausted_retries")
            }
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Toml(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_file_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
