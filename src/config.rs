//! Configuration types.
//!
//! Everything is read from environment variables. Each section exposes a
//! `from_vars` constructor taking a lookup closure so tests never have to
//! touch the process environment.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmConfig;
use crate::mail::arcade::ArcadeConfig;

/// Default temperature for the classification call.
pub const DEFAULT_CLASSIFY_TEMPERATURE: f32 = 0.3;

/// Default temperature for the research call.
pub const DEFAULT_RESEARCH_TEMPERATURE: f32 = 0.2;

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Temperature for the classifier (low, favors consistent labels).
    pub classify_temperature: f32,
    /// Temperature for the researcher (lower, favors factual output).
    pub research_temperature: f32,
    /// Each email body is truncated to this many characters before prompting.
    pub max_body_chars: usize,
    /// Where selected results are written. `None` disables persistence.
    pub output_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classify_temperature: DEFAULT_CLASSIFY_TEMPERATURE,
            research_temperature: DEFAULT_RESEARCH_TEMPERATURE,
            max_body_chars: 4000,
            output_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_vars(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            classify_temperature: temperature(lookup, "CLASSIFY_TEMPERATURE")?
                .unwrap_or(default.classify_temperature),
            research_temperature: temperature(lookup, "RESEARCH_TEMPERATURE")?
                .unwrap_or(default.research_temperature),
            max_body_chars: parsed_or(lookup, "MAX_BODY_CHARS", default.max_body_chars),
            output_dir: lookup("RESEARCH_OUTPUT_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn from_vars(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            host: lookup("SCOUT_HOST").unwrap_or(default.host),
            port: parsed_or(lookup, "SCOUT_PORT", default.port),
        }
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub mail: ArcadeConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mail = ArcadeConfig::from_vars(lookup)?;
        // The completion endpoint is Arcade's OpenAI-compatible gateway unless overridden,
        // so the Arcade key doubles as the LLM key.
        let llm = LlmConfig::from_vars(lookup, &mail.api_key)?;
        Ok(Self {
            llm,
            mail,
            pipeline: PipelineConfig::from_vars(lookup)?,
            server: ServerConfig::from_vars(lookup),
        })
    }
}

/// Read a required, non-empty variable.
pub(crate) fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Read a required secret.
pub(crate) fn required_secret(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<SecretString, ConfigError> {
    required(lookup, key).map(SecretString::from)
}

/// Parse a variable, falling back to `default` when unset or unparseable.
pub(crate) fn parsed_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn temperature(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<f32>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: f32 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}' is not a number"),
    })?;
    if !(0.0..=2.0).contains(&value) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{value} is outside 0.0..=2.0"),
        });
    }
    Ok(Some(value))
}
