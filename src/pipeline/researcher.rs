//! Stage two: one interview record → research bundle.
//!
//! `research` never fails past its boundary. Parse errors, schema errors and
//! transport errors all come back as `ResearchOutcome::Failure`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::extract::{parse_json_payload, validate_payload};
use super::types::{
    InterviewRecord, InterviewType, ResearchBundle, ResearchOutcome, skills_display,
};
use crate::config::DEFAULT_RESEARCH_TEMPERATURE;
use crate::error::PipelineError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

const RESEARCH_SYSTEM_PROMPT: &str = "You are an expert business analyst with deep knowledge of companies, \
industries, and interview preparation. Provide accurate, well-researched information that would be valuable \
for interview preparation. Respond with ONLY the requested JSON object.";

pub struct Researcher {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl Researcher {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            temperature: DEFAULT_RESEARCH_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Research the record's company for its interview.
    pub async fn research_record(&self, record: &InterviewRecord) -> ResearchOutcome {
        self.research(
            &record.company_name,
            &record.role,
            record.interview_type,
            &record.skills,
        )
        .await
    }

    /// Produce company/role research for one interview.
    pub async fn research(
        &self,
        company_name: &str,
        role: &str,
        interview_type: InterviewType,
        skills: &[String],
    ) -> ResearchOutcome {
        info!(
            company = company_name,
            role = role,
            interview_type = interview_type.as_str(),
            "Researching company"
        );

        let request = CompletionRequest::new(vec![
            ChatMessage::system(RESEARCH_SYSTEM_PROMPT),
            ChatMessage::user(build_research_prompt(
                company_name,
                role,
                interview_type,
                skills,
            )),
        ])
        .with_temperature(self.temperature);

        let response = match self.llm.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(company = company_name, error = %e, "Research completion failed");
                return ResearchOutcome::Failure {
                    error: e.to_string(),
                    raw_response: None,
                };
            }
        };

        debug!(
            company = company_name,
            tokens = response.usage().total(),
            "Research completion received"
        );

        let raw = response.content;
        match interpret(&raw) {
            Ok(data) => ResearchOutcome::Success {
                data,
                raw_response: raw,
            },
            Err(e) => {
                warn!(
                    company = company_name,
                    kind = e.label(),
                    error = %e,
                    "Research response rejected"
                );
                ResearchOutcome::Failure {
                    error: failure_message(&e),
                    raw_response: Some(raw),
                }
            }
        }
    }
}

/// Parse then validate, keeping the two error kinds apart.
fn interpret(raw: &str) -> Result<ResearchBundle, PipelineError> {
    let value = parse_json_payload(raw)?;
    validate_payload(value, raw)
}

fn failure_message(error: &PipelineError) -> String {
    match error {
        PipelineError::MalformedResponse { reason, .. } => {
            format!("Failed to parse JSON response: {reason}")
        }
        PipelineError::SchemaValidation { reason, .. } => {
            format!("Research response failed schema validation: {reason}")
        }
        other => other.to_string(),
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_research_prompt(
    company_name: &str,
    role: &str,
    interview_type: InterviewType,
    skills: &[String],
) -> String {
    let kind = interview_type.prompt_label();
    format!(
        r#"You are an expert business analyst and career coach. Provide a comprehensive analysis of {company_name} specifically for a {kind} interview for the role of {role}.

Required skills for this role: {skills}

Provide your analysis in exactly this JSON format:
{{
  "company_summary": {{
    "overview": "Brief company description",
    "industry": "Primary industry and sector",
    "size": "Company size (employees, revenue if known)",
    "culture": "Company culture and values",
    "recent_news": "Recent significant news or developments"
  }},
  "interview_preparation": {{
    "company_specific_questions": [
      "Questions specific to {company_name} and their business"
    ],
    "role_specific_insights": "How {company_name} typically approaches {role} positions",
    "interview_tips": "Specific tips for {kind} interviews at {company_name}",
    "research_sources": "Key areas to research about {company_name}"
  }},
  "competitive_analysis": {{
    "competitors": "Main competitors in their space",
    "market_position": "Where {company_name} stands in the market",
    "growth_trends": "Recent growth or challenges"
  }}
}}

Every field must be filled in. Focus on information that would be most relevant for a {kind} interview for a {role} position."#,
        skills = skills_display(skills),
    )
}
