//! Arcade tool-execution adapter for starred Gmail messages.
//!
//! Flow per fetch:
//! 1. `POST /v1/tools/authorize`. If the user has not granted access yet,
//!    log the authorization link and poll `/v1/auth/status` until it completes.
//! 2. `POST /v1/tools/execute` with the listing input.
//! 3. Convert `output.value.emails[*].body` into `FetchedEmail`s, failing on
//!    any other shape.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{FetchedEmail, MailSource, SourceRef};
use crate::config::{parsed_or, required, required_secret};
use crate::error::{ConfigError, MailError};

/// Default Arcade API root.
pub const DEFAULT_ARCADE_BASE_URL: &str = "https://api.arcade.dev";

/// Default mail listing tool.
pub const DEFAULT_MAIL_TOOL: &str = "Gmail.ListEmails@3.0.0";

const STATUS_COMPLETED: &str = "completed";

/// Arcade adapter configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct ArcadeConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub user_id: String,
    pub tool_name: String,
    pub source: SourceRef,
    pub max_emails: usize,
    /// How many long-poll rounds to wait for the user to authorize.
    pub auth_wait_attempts: u32,
    /// Server-side wait per poll round, in seconds.
    pub auth_wait_secs: u64,
}

impl ArcadeConfig {
    pub fn from_vars(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required_secret(lookup, "ARCADE_API_KEY")?,
            base_url: lookup("ARCADE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ARCADE_BASE_URL.to_string()),
            user_id: required(lookup, "ARCADE_USER_ID")?,
            tool_name: lookup("MAIL_TOOL_NAME").unwrap_or_else(|| DEFAULT_MAIL_TOOL.to_string()),
            source: SourceRef {
                owner: lookup("MAIL_SOURCE_OWNER").unwrap_or_else(|| "ArcadeAI".to_string()),
                name: lookup("MAIL_SOURCE_NAME").unwrap_or_else(|| "arcade-ai".to_string()),
            },
            max_emails: parsed_or(lookup, "MAIL_MAX_EMAILS", 1),
            auth_wait_attempts: parsed_or(lookup, "MAIL_AUTH_WAIT_ATTEMPTS", 3),
            auth_wait_secs: parsed_or(lookup, "MAIL_AUTH_WAIT_SECS", 59),
        })
    }
}

#[derive(Serialize)]
struct AuthorizeRequest<'a> {
    tool_name: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthorizationResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    tool_name: &'a str,
    user_id: &'a str,
    input: Value,
}

/// `MailSource` backed by Arcade's Gmail tool.
pub struct ArcadeMailSource {
    client: reqwest::Client,
    config: ArcadeConfig,
}

impl ArcadeMailSource {
    pub fn new(config: ArcadeConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            // Long-poll rounds must not be cut short by the client.
            .timeout(Duration::from_secs(config.auth_wait_secs + 30))
            .build()
            .map_err(|e| MailError::RequestFailed {
                endpoint: config.base_url.clone(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<T, MailError> {
        let failed = |reason: String| MailError::RequestFailed {
            endpoint: endpoint.to_string(),
            reason,
        };
        let response = request
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!(
                "HTTP {status}: {}",
                crate::util::truncate(&body, 300)
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| failed(format!("Undecodable response: {e}")))
    }

    /// Make sure the user granted the mail tool, waiting for them if needed.
    async fn ensure_authorized(&self) -> Result<(), MailError> {
        let endpoint = "/v1/tools/authorize";
        let request = self.client.post(self.url(endpoint)).json(&AuthorizeRequest {
            tool_name: &self.config.tool_name,
            user_id: &self.config.user_id,
        });
        let mut auth: AuthorizationResponse = self.send_json(request, endpoint).await?;

        if auth.status == STATUS_COMPLETED {
            debug!(tool = %self.config.tool_name, "Mail tool already authorized");
            return Ok(());
        }

        if let Some(ref url) = auth.url {
            info!(
                tool = %self.config.tool_name,
                url = %url,
                "Authorize the mail tool by visiting this link"
            );
        }

        let auth_id = auth.id.clone().ok_or_else(|| MailError::AuthFailed {
            tool: self.config.tool_name.clone(),
            reason: format!("authorization pending ({}) without an id to poll", auth.status),
        })?;

        let endpoint = "/v1/auth/status";
        let wait = self.config.auth_wait_secs.to_string();
        for attempt in 1..=self.config.auth_wait_attempts {
            let request = self.client.get(self.url(endpoint)).query(&[
                ("id", auth_id.as_str()),
                ("wait", wait.as_str()),
            ]);
            auth = self.send_json(request, endpoint).await?;
            debug!(attempt, status = %auth.status, "Polled mail tool authorization");
            if auth.status == STATUS_COMPLETED {
                info!(tool = %self.config.tool_name, "Mail tool authorization completed");
                return Ok(());
            }
        }

        warn!(
            tool = %self.config.tool_name,
            status = %auth.status,
            "Mail tool authorization did not complete"
        );
        Err(MailError::AuthFailed {
            tool: self.config.tool_name.clone(),
            reason: format!("status is '{}' after waiting", auth.status),
        })
    }
}

#[async_trait]
impl MailSource for ArcadeMailSource {
    async fn fetch_starred_emails(
        &self,
        source: &SourceRef,
        max_count: usize,
    ) -> Result<Vec<FetchedEmail>, MailError> {
        self.ensure_authorized().await?;

        let endpoint = "/v1/tools/execute";
        let request = self.client.post(self.url(endpoint)).json(&ExecuteRequest {
            tool_name: &self.config.tool_name,
            user_id: &self.config.user_id,
            // The tool takes every input as a string.
            input: json!({
                "owner": source.owner,
                "name": source.name,
                "starred": "true",
                "n_emails": max_count.to_string(),
            }),
        });
        let payload: Value = self.send_json(request, endpoint).await?;
        let emails = parse_execute_response(&self.config.tool_name, &payload)?;

        info!(count = emails.len(), tool = %self.config.tool_name, "Fetched starred emails");
        Ok(emails)
    }
}

/// Unwrap an execute response into email bodies.
pub fn parse_execute_response(tool: &str, payload: &Value) -> Result<Vec<FetchedEmail>, MailError> {
    let output = payload.get("output");
    let error = output
        .and_then(|o| o.get("error"))
        .filter(|e| !e.is_null());
    let failed = payload.get("success").and_then(Value::as_bool) == Some(false);

    if error.is_some() || failed {
        let message = match error {
            Some(error) => error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
            None => "execution reported success=false".to_string(),
        };
        return Err(MailError::ToolFailed {
            tool: tool.to_string(),
            message,
        });
    }

    let value = output
        .ok_or_else(|| MailError::UnexpectedShape("response has no `output`".to_string()))?
        .get("value")
        .ok_or_else(|| MailError::UnexpectedShape("`output` has no `value`".to_string()))?;
    parse_email_listing(value)
}

/// Convert the tool's listing value (`{"emails": [{"body": ...}, ...]}`).
pub fn parse_email_listing(value: &Value) -> Result<Vec<FetchedEmail>, MailError> {
    let emails = value
        .get("emails")
        .ok_or_else(|| MailError::UnexpectedShape("listing has no `emails` field".to_string()))?
        .as_array()
        .ok_or_else(|| MailError::UnexpectedShape("`emails` is not an array".to_string()))?;

    emails
        .iter()
        .enumerate()
        .map(|(i, email)| {
            let body = email
                .get("body")
                .ok_or_else(|| MailError::UnexpectedShape(format!("emails[{i}] has no `body`")))?;
            body.as_str()
                .map(|b| FetchedEmail {
                    body: b.to_string(),
                })
                .ok_or_else(|| {
                    MailError::UnexpectedShape(format!("emails[{i}].body is not a string"))
                })
        })
        .collect()
}
