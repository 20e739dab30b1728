//! Where previous records come from and where new ones go.
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::github::{CommitRef, GitHubClient, GitHubError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read local history file {path}: {source}")]
    LocalRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Remote store error: {0}")]
    Remote(#[from] GitHubError),
}

pub const DEFAULT_HISTORY_DIR: &str = "history";

/// Repository-relative path of a site's record under `history_dir`.
pub fn record_path(history_dir: &str, slug: &str) -> String {
    format!("{}/{slug}.yml", history_dir.trim_matches('/'))
}

/// Record storage as seen by the runner.
///
/// Absence is not an error: `load_record` and `file_version` return `Ok(None)`
/// for sites that have never been written.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Repository path the record for `slug` is read from and written to.
    fn record_path(&self, slug: &str) -> String;

    /// Text of the last record written for `slug`.
    async fn load_record(&self, slug: &str) -> Result<Option<String>, StoreError>;

    /// Current version token (blob sha) of `path`.
    async fn file_version(&self, path: &str) -> Result<Option<String>, StoreError>;

    /// Writes `content` to `path`, conditional on `version` when given.
    async fn write_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        version: Option<&str>,
    ) -> Result<CommitRef, StoreError>;
}

/// Reads previous records from the local checkout and commits new ones
/// through the contents API. Both sides use the same repository-relative
/// `history_dir`, so what one run commits is what the next run reads.
pub struct RepoHistory {
    checkout: PathBuf,
    history_dir: String,
    client: GitHubClient,
}

impl RepoHistory {
    pub fn new(
        checkout: impl Into<PathBuf>,
        history_dir: impl Into<String>,
        client: GitHubClient,
    ) -> Self {
        Self {
            checkout: checkout.into(),
            history_dir: history_dir.into(),
            client,
        }
    }
}

pub(crate) async fn read_local_record(path: PathBuf) -> Result<Option<String>, StoreError> {
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No previous record on disk.");
            Ok(None)
        }
        Err(source) => Err(StoreError::LocalRead { path, source }),
    }
}

#[async_trait]
impl HistoryStore for RepoHistory {
    fn record_path(&self, slug: &str) -> String {
        record_path(&self.history_dir, slug)
    }

    async fn load_record(&self, slug: &str) -> Result<Option<String>, StoreError> {
        read_local_record(self.checkout.join(self.record_path(slug))).await
    }

    async fn file_version(&self, path: &str) -> Result<Option<String>, StoreError> {
        Ok(self.client.file_sha(path).await?)
    }

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        version: Option<&str>,
    ) -> Result<CommitRef, StoreError> {
        Ok(self.client.put_file(path, content, message, version).await?)
    }
}

#[async_trait]
impl<S: HistoryStore + ?Sized> HistoryStore for Arc<S> {
    fn record_path(&self, slug: &str) -> String {
        (**self).record_path(slug)
    }

    async fn load_record(&self, slug: &str) -> Result<Option<String>, StoreError> {
        (**self).load_record(slug).await
    }

    async fn file_version(&self, path: &str) -> Result<Option<String>, StoreError> {
        (**self).file_version(path).await
    }

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        version: Option<&str>,
    ) -> Result<CommitRef, StoreError> {
        (**self).write_file(path, content, message, version).await
    }
}
