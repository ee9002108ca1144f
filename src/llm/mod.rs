//! LLM integration for Interview Scout.
//!
//! One backend: any OpenAI-compatible `/chat/completions` endpoint, reached
//! with reqwest. By default that is Arcade's gateway, so the same API key
//! authorizes both the mail tool and the completion calls.

mod costs;
pub mod openai;
pub mod provider;

pub use costs::{model_cost, model_cost_or_zero};
pub use openai::OpenAiCompatProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::config::parsed_or;
use crate::error::{ConfigError, LlmError};

/// Default completion endpoint (Arcade's OpenAI-compatible gateway).
pub const DEFAULT_BASE_URL: &str = "https://api.arcade.dev/v1";

/// Default model for both pipeline stages.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Read `LLM_*` variables. `fallback_key` is used when `LLM_API_KEY` is unset.
    pub fn from_vars(
        lookup: &impl Fn(&str) -> Option<String>,
        fallback_key: &SecretString,
    ) -> Result<Self, ConfigError> {
        let api_key = lookup("LLM_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from)
            .unwrap_or_else(|| fallback_key.clone());

        let base_url = lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "LLM_BASE_URL".to_string(),
                message: format!("'{base_url}' is not an http(s) URL"),
            });
        }

        Ok(Self {
            api_key,
            base_url,
            model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(parsed_or(lookup, "LLM_TIMEOUT_SECS", 120)),
        })
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiCompatProvider::new(
        &config.base_url,
        config.api_key.clone(),
        &config.model,
        config.timeout,
    )?;
    tracing::info!(
        model = %config.model,
        base_url = %config.base_url,
        "Using OpenAI-compatible provider"
    );
    Ok(Arc::new(provider))
}
