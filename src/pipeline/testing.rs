//! Test doubles shared by the pipeline unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{LlmError, MailError};
use crate::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
use crate::mail::{FetchedEmail, MailSource, SourceRef};

/// Mock LLM that replays a fixed script of replies, one per call.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every reply succeeds with the given text.
    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

pub fn transport_failure() -> LlmError {
    LlmError::RequestFailed {
        provider: "scripted".into(),
        reason: "connection reset by peer".into(),
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(CompletionResponse {
                content,
                input_tokens: 100,
                output_tokens: 50,
                finish_reason: FinishReason::Stop,
                response_id: None,
            }),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::InvalidResponse {
                provider: "scripted".into(),
                reason: "script exhausted".into(),
            }),
        }
    }
}

/// Mail source returning a fixed set of bodies.
pub struct StaticMail {
    result: Mutex<Option<Result<Vec<FetchedEmail>, MailError>>>,
    bodies: Vec<String>,
}

impl StaticMail {
    pub fn with_bodies(bodies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(None),
            bodies: bodies.iter().map(|b| b.to_string()).collect(),
        })
    }

    /// First fetch fails with `error`.
    pub fn failing(error: MailError) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(Err(error))),
            bodies: Vec::new(),
        })
    }
}

#[async_trait]
impl MailSource for StaticMail {
    async fn fetch_starred_emails(
        &self,
        _source: &SourceRef,
        max_count: usize,
    ) -> Result<Vec<FetchedEmail>, MailError> {
        if let Some(result) = self.result.lock().unwrap().take() {
            return result;
        }
        Ok(self
            .bodies
            .iter()
            .take(max_count)
            .map(|body| FetchedEmail { body: body.clone() })
            .collect())
    }
}
