use tracing::info;

use super::IssueTracker;
use crate::github::{CommitRef, GitHubError, NewIssue};
use crate::monitor::{ProbeResult, SiteStatus};

/// A status change that has just been committed.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub url: &'a str,
    pub slug: &'a str,
    pub previous: SiteStatus,
    pub current: SiteStatus,
    pub probe: ProbeResult,
    pub commit: &'a CommitRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    Opened(u64),
    /// Site went down but a ticket was already open.
    AlreadyOpen(u64),
    /// Site recovered; the ticket got a comment and was closed.
    Closed(u64),
    /// Site recovered with no open ticket to close.
    NoOpenTicket,
    Unchanged,
}

/// Opens a ticket when a site goes down and closes it when the site recovers.
///
/// Tickets are found by the site's slug label. Only the newest open one is
/// ever looked at, so nothing is remembered between runs.
pub struct TicketManager<T> {
    tracker: T,
    assignees: Vec<String>,
}

impl<T: IssueTracker> TicketManager<T> {
    pub fn new(tracker: T, assignees: Vec<String>) -> Self {
        Self { tracker, assignees }
    }

    pub async fn on_transition(
        &self,
        transition: &Transition<'_>,
    ) -> Result<TicketAction, GitHubError> {
        match transition.current {
            SiteStatus::Down => self.open_if_missing(transition).await,
            SiteStatus::Up if transition.previous != SiteStatus::Up => {
                self.close_if_open(transition).await
            }
            _ => Ok(TicketAction::Unchanged),
        }
    }

    async fn open_if_missing(
        &self,
        transition: &Transition<'_>,
    ) -> Result<TicketAction, GitHubError> {
        if let Some(existing) = self.tracker.latest_open_issue(transition.slug).await? {
            info!(
                url = %transition.url,
                issue = existing.number,
                "An issue is already open for this site."
            );
            return Ok(TicketAction::AlreadyOpen(existing.number));
        }

        let issue = self.tracker.create_issue(&self.down_issue(transition)).await?;
        info!(
            url = %transition.url,
            issue = issue.number,
            html_url = issue.html_url.as_deref().unwrap_or("-"),
            "Opened a new issue."
        );
        Ok(TicketAction::Opened(issue.number))
    }

    async fn close_if_open(&self, transition: &Transition<'_>) -> Result<TicketAction, GitHubError> {
        let Some(issue) = self.tracker.latest_open_issue(transition.slug).await? else {
            info!(url = %transition.url, "Could not find a relevant issue to close.");
            return Ok(TicketAction::NoOpenTicket);
        };

        let body = format!(
            "{} is back up in {}.",
            transition.url,
            transition.commit.short_sha()
        );
        self.tracker.create_comment(issue.number, &body).await?;
        info!(url = %transition.url, issue = issue.number, "Created comment in issue.");
        self.tracker.close_issue(issue.number).await?;
        info!(url = %transition.url, issue = issue.number, "Closed issue.");
        Ok(TicketAction::Closed(issue.number))
    }

    fn down_issue(&self, transition: &Transition<'_>) -> NewIssue {
        NewIssue {
            title: format!("⚠️ {} is down", transition.url),
            body: format!(
                "In {}, {} was **down**:\n\n- HTTP code: {}\n- Response time: {} ms\n",
                transition.commit.short_sha(),
                transition.url,
                transition.probe.http_code,
                transition.probe.elapsed_ms
            ),
            assignees: self.assignees.clone(),
            labels: vec!["status".to_string(), transition.slug.to_string()],
        }
    }
}
