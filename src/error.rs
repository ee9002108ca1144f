//! Error types for Interview Scout.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Mail collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail tool {tool} authorization failed: {reason}")]
    AuthFailed { tool: String, reason: String },

    #[error("Mail request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("Mail tool {tool} reported an error: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Unexpected mail payload shape: {0}")]
    UnexpectedShape(String),
}

/// Two-stage pipeline errors.
///
/// `MalformedResponse` and `SchemaValidation` always keep the raw model
/// text so a failed run can be diagnosed from the logs alone.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String, raw: String },

    #[error("Schema validation failed: {reason}")]
    SchemaValidation { reason: String, raw: String },

    #[error("Transport error: {0}")]
    Transport(#[from] LlmError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl PipelineError {
    /// Raw model output attached to the error, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { raw, .. } | Self::SchemaValidation { raw, .. } => Some(raw),
            Self::Transport(_) | Self::NotFound(_) => None,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MalformedResponse { .. } => "malformed_response",
            Self::SchemaValidation { .. } => "schema_validation",
            Self::Transport(_) => "transport",
            Self::NotFound(_) => "not_found",
        }
    }
}

/// Result persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
