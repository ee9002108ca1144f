//! Typed records for both pipeline stages and their validation rules.
//!
//! Deserialization enforces field presence, JSON types and the interview
//! type enum. [`Schema::check`] adds the rules serde cannot express
//! (non-empty strings, date format).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

// ── Schema trait ────────────────────────────────────────────────────

/// A payload type the model is asked to produce.
pub trait Schema: DeserializeOwned {
    /// Semantic checks run after deserialization. Returns the first violation.
    fn check(&self) -> Result<(), String>;
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{field}` must be a non-empty string"))
    } else {
        Ok(())
    }
}

// ── Interview records ───────────────────────────────────────────────

/// Interview stage, as emitted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewType {
    Tech,
    Behavioral,
    IntroductionCall,
}

impl InterviewType {
    /// Wire label (`TECH`, `BEHAVIORAL`, `INTRODUCTION_CALL`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tech => "TECH",
            Self::Behavioral => "BEHAVIORAL",
            Self::IntroductionCall => "INTRODUCTION_CALL",
        }
    }

    /// Phrase used inside prompts ("tech", "behavioral", "introduction call").
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Self::Tech => "tech",
            Self::Behavioral => "behavioral",
            Self::IntroductionCall => "introduction call",
        }
    }
}

/// One interview extracted from an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub company_name: String,
    pub role: String,
    #[serde(rename = "type")]
    pub interview_type: InterviewType,
    /// ISO-8601 timestamp kept verbatim. `None` serializes as `null`.
    #[serde(default)]
    pub interview_date: Option<String>,
    pub skills: Vec<String>,
}

impl InterviewRecord {
    /// Skills joined for display, or "Not specified".
    pub fn skills_display(&self) -> String {
        skills_display(&self.skills)
    }
}

pub(crate) fn skills_display(skills: &[String]) -> String {
    if skills.is_empty() {
        "Not specified".to_string()
    } else {
        skills.join(", ")
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDThh:mm:ss[.f]` and `YYYY-MM-DD`.
pub fn is_iso8601(value: &str) -> bool {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

impl Schema for InterviewRecord {
    fn check(&self) -> Result<(), String> {
        require_text("company_name", &self.company_name)?;
        require_text("role", &self.role)?;
        if let Some(ref date) = self.interview_date
            && !is_iso8601(date)
        {
            return Err(format!("`interview_date` '{date}' is not an ISO-8601 timestamp"));
        }
        Ok(())
    }
}

/// Classifier payload: `{"interview_emails": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewEmails {
    pub interview_emails: Vec<InterviewRecord>,
}

impl Schema for InterviewEmails {
    fn check(&self) -> Result<(), String> {
        for (i, record) in self.interview_emails.iter().enumerate() {
            record
                .check()
                .map_err(|e| format!("interview_emails[{i}]: {e}"))?;
        }
        Ok(())
    }
}

// ── Research bundle ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub overview: String,
    pub industry: String,
    pub size: String,
    pub culture: String,
    pub recent_news: String,
}

impl CompanySummary {
    fn check(&self) -> Result<(), String> {
        require_text("company_summary.overview", &self.overview)?;
        require_text("company_summary.industry", &self.industry)?;
        require_text("company_summary.size", &self.size)?;
        require_text("company_summary.culture", &self.culture)?;
        require_text("company_summary.recent_news", &self.recent_news)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewPreparation {
    pub company_specific_questions: Vec<String>,
    pub role_specific_insights: String,
    pub interview_tips: String,
    pub research_sources: String,
}

impl InterviewPreparation {
    fn check(&self) -> Result<(), String> {
        if self.company_specific_questions.is_empty() {
            return Err(
                "`interview_preparation.company_specific_questions` must not be empty".into(),
            );
        }
        for (i, question) in self.company_specific_questions.iter().enumerate() {
            require_text(
                &format!("interview_preparation.company_specific_questions[{i}]"),
                question,
            )?;
        }
        require_text(
            "interview_preparation.role_specific_insights",
            &self.role_specific_insights,
        )?;
        require_text("interview_preparation.interview_tips", &self.interview_tips)?;
        require_text(
            "interview_preparation.research_sources",
            &self.research_sources,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitiveAnalysis {
    pub competitors: String,
    pub market_position: String,
    pub growth_trends: String,
}

impl CompetitiveAnalysis {
    fn check(&self) -> Result<(), String> {
        require_text("competitive_analysis.competitors", &self.competitors)?;
        require_text("competitive_analysis.market_position", &self.market_position)?;
        require_text("competitive_analysis.growth_trends", &self.growth_trends)
    }
}

/// Validated three-part research output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchBundle {
    pub company_summary: CompanySummary,
    pub interview_preparation: InterviewPreparation,
    pub competitive_analysis: CompetitiveAnalysis,
}

impl Schema for ResearchBundle {
    fn check(&self) -> Result<(), String> {
        self.company_summary.check()?;
        self.interview_preparation.check()?;
        self.competitive_analysis.check()
    }
}

// ── Outcomes ────────────────────────────────────────────────────────

/// Result of one research call. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResearchOutcome {
    Success {
        data: ResearchBundle,
        raw_response: String,
    },
    Failure {
        error: String,
        raw_response: Option<String>,
    },
}

impl ResearchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&ResearchBundle> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Success { raw_response, .. } => Some(raw_response),
            Self::Failure { raw_response, .. } => raw_response.as_deref(),
        }
    }
}

/// Wire shape: `{"success": bool, "data"?: ..., "error"?: ..., "raw_response": ...}`.
#[derive(Serialize)]
struct OutcomeWire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a ResearchBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    raw_response: Option<&'a str>,
}

impl Serialize for ResearchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OutcomeWire {
            success: self.is_success(),
            data: self.data(),
            error: self.error(),
            raw_response: self.raw_response(),
        }
        .serialize(serializer)
    }
}

/// The unit returned to callers: an interview plus its research.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub interview_info: InterviewRecord,
    pub research_data: ResearchBundle,
}
