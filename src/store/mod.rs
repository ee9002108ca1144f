//! ResearchStore: writes selected interview research to JSON files.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::StoreError;
use crate::pipeline::types::CompositeResult;
use crate::util::slug;

/// File-backed result storage, one pretty-printed JSON file per interview.
#[derive(Debug, Clone)]
pub struct ResearchStore {
    dir: PathBuf,
}

impl ResearchStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `research_{company_slug}_{type}.json`
    pub fn file_name(result: &CompositeResult) -> String {
        format!(
            "research_{}_{}.json",
            slug(&result.interview_info.company_name),
            result.interview_info.interview_type.as_str().to_lowercase()
        )
    }

    /// Persist `result`, overwriting any earlier file for the same company and type.
    pub async fn save(&self, result: &CompositeResult) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Write {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(Self::file_name(result));
        let body = serde_json::to_string_pretty(result)?;
        debug!(path = %path.display(), bytes = body.len(), "Writing research file");

        tokio::fs::write(&path, body)
            .await
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;

        info!(
            path = %path.display(),
            company = %result.interview_info.company_name,
            "Research saved"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{InterviewType, ResearchBundle, fixtures};

    fn composite(company: &str, interview_type: InterviewType) -> CompositeResult {
        CompositeResult {
            interview_info: fixtures::record(company, interview_type),
            research_data: serde_json::from_str::<ResearchBundle>(&fixtures::bundle_json(company))
                .unwrap(),
        }
    }

    #[test]
    fn file_name_uses_slug_and_lowercase_type() {
        let result = composite("Acme  Corp", InterviewType::IntroductionCall);
        assert_eq!(
            ResearchStore::file_name(&result),
            "research_acme_corp_introduction_call.json"
        );
    }

    #[tokio::test]
    async fn save_creates_directory_and_writes_json() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResearchStore::new(tmp.path().join("nested").join("out"));
        let result = composite("Acme Corp", InterviewType::Tech);

        let path = store.save(&result).await.unwrap();
        assert!(path.ends_with("research_acme_corp_tech.json"));

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: CompositeResult = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, result);
        assert!(written.contains("\n  \"interview_info\""));
    }

    #[tokio::test]
    async fn save_overwrites_previous_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResearchStore::new(tmp.path());

        let mut result = composite("Acme", InterviewType::Behavioral);
        store.save(&result).await.unwrap();
        result.interview_info.role = "Staff Engineer".into();
        let path = store.save(&result).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("Staff Engineer"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn save_into_a_file_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "not a dir").unwrap();

        let store = ResearchStore::new(&blocker);
        let err = store
            .save(&composite("Acme", InterviewType::Tech))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
