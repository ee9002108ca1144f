//! Progress events emitted during an orchestration run.
//!
//! Events are observational only. Nothing in the pipeline reads them back.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

use super::types::{InterviewRecord, ResearchBundle};
use crate::util::truncate;

/// Preview length for summary fields and raw responses.
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    EmailsFetched {
        run_id: String,
        count: usize,
    },
    Classified {
        run_id: String,
        count: usize,
    },
    ClassificationFailed {
        run_id: String,
        kind: String,
        error: String,
    },
    RecordStarted {
        run_id: String,
        index: usize,
        company_name: String,
        role: String,
        interview_type: String,
        interview_date: Option<String>,
        skills: String,
    },
    ResearchSucceeded {
        run_id: String,
        index: usize,
        company_name: String,
        overview: String,
        industry: String,
        size: String,
        question_count: usize,
    },
    ResearchFailed {
        run_id: String,
        index: usize,
        company_name: String,
        error: String,
        raw_response: Option<String>,
    },
    Selected {
        run_id: String,
        index: usize,
        company_name: String,
    },
    NothingSelected {
        run_id: String,
        records: usize,
    },
}

impl PipelineEvent {
    pub(crate) fn record_started(run_id: &str, index: usize, record: &InterviewRecord) -> Self {
        Self::RecordStarted {
            run_id: run_id.to_string(),
            index,
            company_name: record.company_name.clone(),
            role: record.role.clone(),
            interview_type: record.interview_type.as_str().to_string(),
            interview_date: record.interview_date.clone(),
            skills: record.skills_display(),
        }
    }

    pub(crate) fn research_succeeded(
        run_id: &str,
        index: usize,
        company_name: &str,
        bundle: &ResearchBundle,
    ) -> Self {
        Self::ResearchSucceeded {
            run_id: run_id.to_string(),
            index,
            company_name: company_name.to_string(),
            overview: truncate(&bundle.company_summary.overview, PREVIEW_CHARS),
            industry: truncate(&bundle.company_summary.industry, PREVIEW_CHARS),
            size: truncate(&bundle.company_summary.size, PREVIEW_CHARS),
            question_count: bundle.interview_preparation.company_specific_questions.len(),
        }
    }

    pub(crate) fn research_failed(
        run_id: &str,
        index: usize,
        company_name: &str,
        error: &str,
        raw_response: Option<&str>,
    ) -> Self {
        Self::ResearchFailed {
            run_id: run_id.to_string(),
            index,
            company_name: company_name.to_string(),
            error: error.to_string(),
            raw_response: raw_response.map(|raw| truncate(raw, PREVIEW_CHARS)),
        }
    }
}

/// Receiver for pipeline progress.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PipelineEvent);
}

/// Default sink: one structured log line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::EmailsFetched { run_id, count } => {
                info!(run_id = %run_id, count, "Fetched starred emails");
            }
            PipelineEvent::Classified { run_id, count } => {
                info!(run_id = %run_id, count, "Found interview emails");
            }
            PipelineEvent::ClassificationFailed { run_id, kind, error } => {
                warn!(
                    run_id = %run_id,
                    kind = %kind,
                    error = %error,
                    "Email classification failed"
                );
            }
            PipelineEvent::RecordStarted {
                run_id,
                index,
                company_name,
                role,
                interview_type,
                interview_date,
                skills,
            } => {
                info!(
                    run_id = %run_id,
                    index,
                    company = %company_name,
                    role = %role,
                    interview_type = %interview_type,
                    interview_date = interview_date.as_deref().unwrap_or("-"),
                    skills = %skills,
                    "Processing interview"
                );
            }
            PipelineEvent::ResearchSucceeded {
                run_id,
                index,
                company_name,
                overview,
                industry,
                size,
                question_count,
            } => {
                info!(
                    run_id = %run_id,
                    index,
                    company = %company_name,
                    overview = %overview,
                    industry = %industry,
                    size = %size,
                    question_count,
                    "Research completed"
                );
            }
            PipelineEvent::ResearchFailed {
                run_id,
                index,
                company_name,
                error,
                raw_response,
            } => {
                warn!(
                    run_id = %run_id,
                    index,
                    company = %company_name,
                    error = %error,
                    raw_response = raw_response.as_deref().unwrap_or("-"),
                    "Research failed"
                );
            }
            PipelineEvent::Selected {
                run_id,
                index,
                company_name,
            } => {
                info!(
                    run_id = %run_id,
                    index,
                    company = %company_name,
                    "Selected interview research"
                );
            }
            PipelineEvent::NothingSelected { run_id, records } => {
                info!(run_id = %run_id, records, "No interview research produced");
            }
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
