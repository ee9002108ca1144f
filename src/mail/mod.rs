//! Mail retrieval collaborator.
//!
//! The pipeline only needs raw email bodies. Everything about where they
//! come from (tool authorization, request shape, payload layout) stays
//! behind `MailSource`.

pub mod arcade;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MailError;

pub use arcade::{ArcadeConfig, ArcadeMailSource};

/// The mailbox/source identifier passed through to the mail tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub owner: String,
    pub name: String,
}

/// One fetched email, reduced to what the classifier consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedEmail {
    pub body: String,
}

/// Something that can list starred emails.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Fetch up to `max_count` starred emails from `source`, newest first.
    async fn fetch_starred_emails(
        &self,
        source: &SourceRef,
        max_count: usize,
    ) -> Result<Vec<FetchedEmail>, MailError>;
}
