//! Minimal GitHub REST client: repository contents and issues.
use serde::{Deserialize, Serialize};

pub mod client;
pub mod error;

pub use client::GitHubClient;
pub use error::GitHubError;

/// The commit created by a contents write.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

impl CommitRef {
    /// Seven-character abbreviated sha used in ticket text.
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
}
