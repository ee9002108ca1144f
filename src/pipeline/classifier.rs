//! Stage one: raw email bodies → validated interview records.
//!
//! One completion call per batch. The reply must be a JSON object of the
//! form `{"interview_emails": [...]}`; anything else is a terminal failure
//! for this invocation. No retries.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::extract::parse_structured;
use super::types::{InterviewEmails, InterviewRecord};
use crate::config::DEFAULT_CLASSIFY_TEMPERATURE;
use crate::error::PipelineError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Default per-email truncation before prompting.
const DEFAULT_MAX_BODY_CHARS: usize = 4000;

pub struct Classifier {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
    max_body_chars: usize,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            temperature: DEFAULT_CLASSIFY_TEMPERATURE,
            max_body_chars: DEFAULT_MAX_BODY_CHARS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_body_chars(mut self, max_body_chars: usize) -> Self {
        self.max_body_chars = max_body_chars;
        self
    }

    /// Classify a batch of email bodies into interview records, in model order.
    ///
    /// An empty batch returns an empty list without calling the model.
    pub async fn classify(
        &self,
        email_bodies: &[String],
    ) -> Result<Vec<InterviewRecord>, PipelineError> {
        if email_bodies.is_empty() {
            debug!("No emails to classify");
            return Ok(Vec::new());
        }

        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_classifier_system_prompt()),
            ChatMessage::user(build_classifier_user_prompt(
                email_bodies,
                self.max_body_chars,
            )),
        ])
        .with_temperature(self.temperature);

        let response = self.llm.complete(request).await?;

        let usage = response.usage();
        debug!(
            model = self.llm.model_name(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            cost_usd = %usage.cost(self.llm.cost_per_token()),
            response = %response.content,
            "Classification completion received"
        );

        let parsed: InterviewEmails = parse_structured(&response.content).map_err(|e| {
            warn!(
                kind = e.label(),
                error = %e,
                raw_response = %response.content,
                "Classification response rejected"
            );
            e
        })?;

        info!(
            emails = email_bodies.len(),
            interviews = parsed.interview_emails.len(),
            "Classified emails"
        );
        Ok(parsed.interview_emails)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_classifier_system_prompt() -> String {
    "You are an expert email classifier specializing in identifying and categorizing job interview emails. \
     Analyze the email content and extract the interview details.\n\n\
     Respond with ONLY a JSON object in exactly this format:\n\
     {\n\
       \"interview_emails\": [\n\
         {\n\
           \"company_name\": \"string\",\n\
           \"role\": \"string\",\n\
           \"type\": \"TECH\" | \"BEHAVIORAL\" | \"INTRODUCTION_CALL\",\n\
           \"interview_date\": \"YYYY-MM-DDThh:mm:ss\" or null,\n\
           \"skills\": [\"string\"]\n\
         }\n\
       ]\n\
     }\n\n\
     Rules:\n\
     - Only include emails that are clearly about a job interview\n\
     - TECH = technical interviews, BEHAVIORAL = behavioral/culture fit, INTRODUCTION_CALL = initial screening calls\n\
     - \"type\" must be one of the three values above, nothing else\n\
     - Extract skills mentioned in the email or implied by the role\n\
     - If no specific date is mentioned, use null for interview_date\n\
     - If no skills are mentioned, use an empty array\n\
     - If no email is interview related, return {\"interview_emails\": []}"
        .to_string()
}

fn build_classifier_user_prompt(email_bodies: &[String], max_body_chars: usize) -> String {
    let mut prompt = String::from(
        "Please analyze the following emails from my inbox and identify any job interview related emails:\n",
    );
    for (i, body) in email_bodies.iter().enumerate() {
        let preview: String = body.chars().take(max_body_chars).collect();
        prompt.push_str(&format!("\n--- Email {} ---\n{}\n", i + 1, preview.trim()));
    }
    prompt
}
