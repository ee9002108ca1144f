//! Two-stage interview research pipeline.
//!
//! Starred emails flow through:
//! 1. `MailSource::fetch_starred_emails()`: raw bodies
//! 2. `Classifier::classify()`: one LLM call, typed interview records
//! 3. `Researcher::research()`: one LLM call per record, typed research bundle
//! 4. `Orchestrator::run()`: first record whose research succeeds wins
//!
//! Model output is never trusted until it has been parsed and validated
//! against the record types in [`types`].

pub mod classifier;
pub mod events;
pub mod extract;
pub mod orchestrator;
pub mod researcher;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::Classifier;
pub use events::{EventSink, MemorySink, PipelineEvent, TracingSink};
pub use orchestrator::Orchestrator;
pub use researcher::Researcher;
pub use types::{CompositeResult, InterviewRecord, InterviewType, ResearchBundle, ResearchOutcome};
