//! Ticket bookkeeping for up/down transitions.
use async_trait::async_trait;
use std::sync::Arc;

use crate::github::{GitHubClient, GitHubError, Issue, NewIssue};

pub mod tickets;

pub use tickets::{TicketAction, TicketManager, Transition};

/// Issue operations the ticket manager relies on.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Most recently created open issue labelled `label`.
    async fn latest_open_issue(&self, label: &str) -> Result<Option<Issue>, GitHubError>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, GitHubError>;

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), GitHubError>;

    async fn close_issue(&self, number: u64) -> Result<(), GitHubError>;
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn latest_open_issue(&self, label: &str) -> Result<Option<Issue>, GitHubError> {
        GitHubClient::latest_open_issue(self, label).await
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, GitHubError> {
        GitHubClient::create_issue(self, issue).await
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), GitHubError> {
        GitHubClient::create_comment(self, number, body).await
    }

    async fn close_issue(&self, number: u64) -> Result<(), GitHubError> {
        GitHubClient::close_issue(self, number).await
    }
}

#[async_trait]
impl<T: IssueTracker + ?Sized> IssueTracker for Arc<T> {
    async fn latest_open_issue(&self, label: &str) -> Result<Option<Issue>, GitHubError> {
        (**self).latest_open_issue(label).await
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, GitHubError> {
        (**self).create_issue(issue).await
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), GitHubError> {
        (**self).create_comment(number, body).await
    }

    async fn close_issue(&self, number: u64) -> Result<(), GitHubError> {
        (**self).close_issue(number).await
    }
}
