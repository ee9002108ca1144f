//! Orchestrator: fetch, classify, then research records until one succeeds.
//!
//! Every step is awaited in order. A record whose research fails is
//! skipped. A classification failure ends the run with no result.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classifier::Classifier;
use super::events::{EventSink, PipelineEvent, TracingSink};
use super::researcher::Researcher;
use super::types::{CompositeResult, InterviewRecord, ResearchOutcome};
use crate::config::{AppConfig, PipelineConfig};
use crate::error::Error;
use crate::llm::{LlmProvider, create_provider};
use crate::mail::{ArcadeMailSource, MailSource, SourceRef};
use crate::store::ResearchStore;

pub struct Orchestrator {
    mail: Arc<dyn MailSource>,
    classifier: Classifier,
    researcher: Researcher,
    sink: Arc<dyn EventSink>,
    store: Option<ResearchStore>,
    source: SourceRef,
    max_emails: usize,
}

impl Orchestrator {
    /// Both stages share the one `llm` transport.
    pub fn new(
        mail: Arc<dyn MailSource>,
        llm: Arc<dyn LlmProvider>,
        source: SourceRef,
        max_emails: usize,
    ) -> Self {
        Self {
            mail,
            classifier: Classifier::new(Arc::clone(&llm)),
            researcher: Researcher::new(llm),
            sink: Arc::new(TracingSink),
            store: None,
            source,
            max_emails,
        }
    }

    /// Wire the Arcade mailbox and the completion provider from `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let llm = create_provider(&config.llm)?;
        let mail: Arc<dyn MailSource> = Arc::new(ArcadeMailSource::new(config.mail.clone())?);
        Ok(Self::new(
            mail,
            llm,
            config.mail.source.clone(),
            config.mail.max_emails,
        )
        .with_pipeline_config(&config.pipeline))
    }

    /// Apply temperatures, body truncation and the optional output directory.
    pub fn with_pipeline_config(mut self, config: &PipelineConfig) -> Self {
        self.classifier = self
            .classifier
            .with_temperature(config.classify_temperature)
            .with_max_body_chars(config.max_body_chars);
        self.researcher = self
            .researcher
            .with_temperature(config.research_temperature);
        if let Some(ref dir) = config.output_dir {
            self.store = Some(ResearchStore::new(dir.clone()));
        }
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_store(mut self, store: ResearchStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Run once and return the first interview whose research succeeded.
    ///
    /// Records after the selected one are never researched.
    pub async fn run(&self) -> Result<Option<CompositeResult>, Error> {
        let run_id = Uuid::new_v4().to_string();
        let Some(records) = self.fetch_and_classify(&run_id).await? else {
            return Ok(None);
        };

        for (index, record) in records.iter().enumerate() {
            if let Some(result) = self.research_record(&run_id, index, record).await {
                self.sink.emit(&PipelineEvent::Selected {
                    run_id: run_id.clone(),
                    index,
                    company_name: record.company_name.clone(),
                });
                self.persist(&result).await;
                return Ok(Some(result));
            }
        }

        self.sink.emit(&PipelineEvent::NothingSelected {
            run_id,
            records: records.len(),
        });
        Ok(None)
    }

    /// Research every classified record and return all successes, in order.
    pub async fn run_all(&self) -> Result<Vec<CompositeResult>, Error> {
        let run_id = Uuid::new_v4().to_string();
        let Some(records) = self.fetch_and_classify(&run_id).await? else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for (index, record) in records.iter().enumerate() {
            if let Some(result) = self.research_record(&run_id, index, record).await {
                self.sink.emit(&PipelineEvent::Selected {
                    run_id: run_id.clone(),
                    index,
                    company_name: record.company_name.clone(),
                });
                self.persist(&result).await;
                results.push(result);
            }
        }

        if results.is_empty() {
            self.sink.emit(&PipelineEvent::NothingSelected {
                run_id,
                records: records.len(),
            });
        }
        Ok(results)
    }

    /// `Ok(None)` when classification failed.
    async fn fetch_and_classify(
        &self,
        run_id: &str,
    ) -> Result<Option<Vec<InterviewRecord>>, Error> {
        info!(
            run_id = %run_id,
            owner = %self.source.owner,
            name = %self.source.name,
            max_emails = self.max_emails,
            "Starting interview research run"
        );

        let emails = self
            .mail
            .fetch_starred_emails(&self.source, self.max_emails)
            .await?;
        self.sink.emit(&PipelineEvent::EmailsFetched {
            run_id: run_id.to_string(),
            count: emails.len(),
        });

        let bodies: Vec<String> = emails.into_iter().map(|email| email.body).collect();
        let records = match self.classifier.classify(&bodies).await {
            Ok(records) => records,
            Err(e) => {
                self.sink.emit(&PipelineEvent::ClassificationFailed {
                    run_id: run_id.to_string(),
                    kind: e.label().to_string(),
                    error: e.to_string(),
                });
                return Ok(None);
            }
        };

        self.sink.emit(&PipelineEvent::Classified {
            run_id: run_id.to_string(),
            count: records.len(),
        });
        Ok(Some(records))
    }

    async fn research_record(
        &self,
        run_id: &str,
        index: usize,
        record: &InterviewRecord,
    ) -> Option<CompositeResult> {
        self.sink
            .emit(&PipelineEvent::record_started(run_id, index, record));

        match self.researcher.research_record(record).await {
            ResearchOutcome::Success { data, .. } => {
                self.sink.emit(&PipelineEvent::research_succeeded(
                    run_id,
                    index,
                    &record.company_name,
                    &data,
                ));
                Some(CompositeResult {
                    interview_info: record.clone(),
                    research_data: data,
                })
            }
            ResearchOutcome::Failure {
                error,
                raw_response,
            } => {
                self.sink.emit(&PipelineEvent::research_failed(
                    run_id,
                    index,
                    &record.company_name,
                    &error,
                    raw_response.as_deref(),
                ));
                None
            }
        }
    }

    async fn persist(&self, result: &CompositeResult) {
        let Some(ref store) = self.store else {
            debug!("No output directory configured, skipping save");
            return;
        };
        if let Err(e) = store.save(result).await {
            warn!(error = %e, "Failed to save research result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailError;
    use crate::pipeline::events::MemorySink;
    use crate::pipeline::testing::{ScriptedLlm, StaticMail, transport_failure};
    use crate::pipeline::types::InterviewType;

    const THREE_RECORDS: &str = r#"{"interview_emails":[
        {"company_name":"Initech","role":"SRE","type":"BEHAVIORAL","interview_date":null,"skills":[]},
        {"company_name":"Acme Corp","role":"Backend Engineer","type":"TECH","interview_date":"2025-03-14T10:00:00","skills":["Go","SQL"]},
        {"company_name":"Globex","role":"Designer","type":"INTRODUCTION_CALL","interview_date":null,"skills":["Figma"]}
    ]}"#;

    fn source() -> SourceRef {
        SourceRef {
            owner: "ArcadeAI".into(),
            name: "arcade-ai".into(),
        }
    }

    fn orchestrator(
        mail: Arc<StaticMail>,
        llm: Arc<ScriptedLlm>,
        sink: Arc<MemorySink>,
    ) -> Orchestrator {
        Orchestrator::new(mail, llm, source(), 5).with_sink(sink)
    }

    #[test]
    fn from_config_applies_mail_and_pipeline_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().to_string_lossy().into_owned();
        let lookup = |key: &str| match key {
            "ARCADE_API_KEY" => Some("arc_test".to_string()),
            "ARCADE_USER_ID" => Some("me@example.com".to_string()),
            "MAIL_MAX_EMAILS" => Some("3".to_string()),
            "MAIL_SOURCE_OWNER" => Some("acme".to_string()),
            "RESEARCH_OUTPUT_DIR" => Some(out.clone()),
            _ => None,
        };
        let config = AppConfig::from_vars(&lookup).unwrap();

        let orch = Orchestrator::from_config(&config).unwrap();
        assert_eq!(orch.max_emails, 3);
        assert_eq!(orch.source.owner, "acme");
        assert!(orch.store.is_some());
    }

    #[tokio::test]
    async fn first_success_wins_and_later_records_are_skipped() {
        let acme = crate::pipeline::types::fixtures::bundle_json("Acme Corp");
        let llm = ScriptedLlm::replying(&[THREE_RECORDS, "not json at all", &acme]);
        let sink = Arc::new(MemorySink::new());
        let orch = orchestrator(
            StaticMail::with_bodies(&["interview invite"]),
            llm.clone(),
            sink.clone(),
        );

        let result = orch.run().await.unwrap().expect("second record succeeds");
        assert_eq!(result.interview_info.company_name, "Acme Corp");
        assert_eq!(result.interview_info.interview_type, InterviewType::Tech);
        assert_eq!(result.research_data.company_summary.industry, "Software");

        // classify + two research calls, never the third
        assert_eq!(llm.calls(), 3);

        let events = sink.events();
        assert!(events.iter().any(|e| matches!(
            e,
            PipelineEvent::ResearchFailed { index: 0, raw_response: Some(_), .. }
        )));
        assert!(matches!(
            events.last(),
            Some(PipelineEvent::Selected { index: 1, .. })
        ));
        assert!(!events.iter().any(|e| matches!(
            e,
            PipelineEvent::RecordStarted { index: 2, .. }
        )));
    }

    #[tokio::test]
    async fn classification_failure_returns_none_without_research() {
        let llm = ScriptedLlm::replying(&[
            r#"{"interview_emails":[{"company_name":"Acme","role":"SRE","type":"ONSITE","interview_date":null,"skills":[]}]}"#,
        ]);
        let sink = Arc::new(MemorySink::new());
        let orch = orchestrator(
            StaticMail::with_bodies(&["onsite"]),
            llm.clone(),
            sink.clone(),
        );

        assert!(orch.run().await.unwrap().is_none());
        assert_eq!(llm.calls(), 1);
        assert!(sink.events().iter().any(|e| matches!(
            e,
            PipelineEvent::ClassificationFailed { kind, .. } if kind == "schema_validation"
        )));
    }

    #[tokio::test]
    async fn no_interviews_returns_none() {
        let llm = ScriptedLlm::replying(&[r#"{"interview_emails": []}"#]);
        let sink = Arc::new(MemorySink::new());
        let orch = orchestrator(
            StaticMail::with_bodies(&["weekly newsletter"]),
            llm.clone(),
            sink.clone(),
        );

        assert!(orch.run().await.unwrap().is_none());
        assert_eq!(llm.calls(), 1);
        assert!(matches!(
            sink.events().last(),
            Some(PipelineEvent::NothingSelected { records: 0, .. })
        ));
    }

    #[tokio::test]
    async fn empty_inbox_skips_the_model() {
        let llm = ScriptedLlm::replying(&[]);
        let orch = orchestrator(
            StaticMail::with_bodies(&[]),
            llm.clone(),
            Arc::new(MemorySink::new()),
        );
        assert!(orch.run().await.unwrap().is_none());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn every_research_failing_returns_none() {
        let llm = ScriptedLlm::new(vec![
            Ok(THREE_RECORDS.to_string()),
            Err(transport_failure()),
            Ok("{}".to_string()),
            Ok("{\"company_summary\":".to_string()),
        ]);
        let sink = Arc::new(MemorySink::new());
        let orch = orchestrator(
            StaticMail::with_bodies(&["a"]),
            llm.clone(),
            sink.clone(),
        );

        assert!(orch.run().await.unwrap().is_none());
        assert_eq!(llm.calls(), 4);
        assert!(matches!(
            sink.events().last(),
            Some(PipelineEvent::NothingSelected { records: 3, .. })
        ));
    }

    #[tokio::test]
    async fn identical_responses_give_identical_json() {
        let acme = crate::pipeline::types::fixtures::bundle_json("Acme Corp");
        let mut outputs = Vec::new();
        for _ in 0..2 {
            let llm = ScriptedLlm::replying(&[THREE_RECORDS, &acme]);
            let orch = orchestrator(
                StaticMail::with_bodies(&["invite"]),
                llm,
                Arc::new(MemorySink::new()),
            );
            let result = orch.run().await.unwrap().unwrap();
            outputs.push(serde_json::to_string(&result).unwrap());
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[tokio::test]
    async fn mail_failure_propagates() {
        let llm = ScriptedLlm::replying(&[]);
        let orch = orchestrator(
            StaticMail::failing(MailError::UnexpectedShape("missing emails".into())),
            llm.clone(),
            Arc::new(MemorySink::new()),
        );
        let err = orch.run().await.unwrap_err();
        assert!(matches!(err, Error::Mail(MailError::UnexpectedShape(_))));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn run_all_collects_every_success() {
        let acme = crate::pipeline::types::fixtures::bundle_json("Acme Corp");
        let globex = crate::pipeline::types::fixtures::bundle_json("Globex");
        let llm = ScriptedLlm::replying(&[THREE_RECORDS, "nope", &acme, &globex]);
        let orch = orchestrator(
            StaticMail::with_bodies(&["invite"]),
            llm.clone(),
            Arc::new(MemorySink::new()),
        );

        let results = orch.run_all().await.unwrap();
        let companies: Vec<_> = results
            .iter()
            .map(|r| r.interview_info.company_name.as_str())
            .collect();
        assert_eq!(companies, vec!["Acme Corp", "Globex"]);
        assert_eq!(llm.calls(), 4);
    }

    #[tokio::test]
    async fn selected_result_is_persisted() {
        let tmp = tempfile::tempdir().unwrap();
        let acme = crate::pipeline::types::fixtures::bundle_json("Acme Corp");
        let llm = ScriptedLlm::replying(&[THREE_RECORDS, &acme]);
        let orch = orchestrator(
            StaticMail::with_bodies(&["invite"]),
            llm,
            Arc::new(MemorySink::new()),
        )
        .with_pipeline_config(&PipelineConfig {
            output_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        });

        let result = orch.run().await.unwrap().unwrap();
        assert_eq!(result.interview_info.company_name, "Initech");
        let expected = tmp.path().join(ResearchStore::file_name(&result));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn persistence_failure_does_not_change_result() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();

        let acme = crate::pipeline::types::fixtures::bundle_json("Acme Corp");
        let llm = ScriptedLlm::replying(&[THREE_RECORDS, &acme]);
        let orch = orchestrator(
            StaticMail::with_bodies(&["invite"]),
            llm,
            Arc::new(MemorySink::new()),
        )
        .with_store(ResearchStore::new(&blocker));

        assert!(orch.run().await.unwrap().is_some());
    }
}
