//! One pass over the configured sites.
use chrono::Utc;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{error, info, warn};

use super::history::{HistoryStore, StoreError};
use super::probe::{ProbeResult, Prober};
use super::record::{HistoryRecord, PriorRecord, format_rfc1123};
use super::slug::slugify_url;
use super::status::SiteStatus;
use crate::alerting::{IssueTracker, TicketAction, TicketManager, Transition};
use crate::github::CommitRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Write a record only when a site's status changed.
    Changes,
    /// Write a record for every site.
    Commit,
}

impl RunMode {
    /// `commit` forces a full refresh; anything else is a normal run.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("commit") => RunMode::Commit,
            _ => RunMode::Changes,
        }
    }
}

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Failed to load previous record: {0}")]
    Load(#[source] StoreError),
    #[error("Failed to look up record version: {0}")]
    Version(#[source] StoreError),
    #[error("Failed to write record: {0}")]
    Write(#[source] StoreError),
}

impl SiteError {
    pub fn stage(&self) -> &'static str {
        match self {
            SiteError::Load(_) => "load",
            SiteError::Version(_) => "version",
            SiteError::Write(_) => "write",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteOutcome {
    pub url: String,
    pub slug: String,
    pub previous: SiteStatus,
    pub current: SiteStatus,
    pub probe: ProbeResult,
    pub start_time: String,
    /// Commit of the record written this run, if any.
    pub commit: Option<CommitRef>,
    /// Set only when the write succeeded and the status differs from before.
    pub delta: bool,
    pub ticket: Option<TicketAction>,
}

#[derive(Debug)]
pub struct SiteFailure {
    pub url: String,
    pub error: SiteError,
}

/// Per-site results of one run, in configuration order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<SiteOutcome>,
    pub failures: Vec<SiteFailure>,
}

impl RunReport {
    pub fn has_delta(&self) -> bool {
        self.outcomes.iter().any(|o| o.delta)
    }

    pub fn writes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.commit.is_some()).count()
    }
}

pub struct StatusRunner<S, T> {
    prober: Prober,
    store: S,
    tickets: TicketManager<T>,
    concurrency: usize,
}

impl<S, T> StatusRunner<S, T>
where
    S: HistoryStore,
    T: IssueTracker,
{
    pub fn new(prober: Prober, store: S, tickets: TicketManager<T>) -> Self {
        Self {
            prober,
            store,
            tickets,
            concurrency: 1,
        }
    }

    /// Sites probed at once. 1 (the default) is strictly sequential.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Processes every site. A failing site is recorded in the report and
    /// never stops the others.
    pub async fn run(&self, sites: &[String], mode: RunMode) -> RunReport {
        let results: Vec<(String, Result<SiteOutcome, SiteError>)> = stream::iter(sites)
            .map(|url| async move { (url.clone(), self.process_site(url, mode).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = RunReport::default();
        for (url, result) in results {
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    error!(url = %url, stage = e.stage(), error = %e, "Failed to process site.");
                    report.failures.push(SiteFailure { url, error: e });
                }
            }
        }
        info!(
            sites = sites.len(),
            writes = report.writes(),
            failures = report.failures.len(),
            has_delta = report.has_delta(),
            "Run finished."
        );
        report
    }

    pub async fn process_site(&self, url: &str, mode: RunMode) -> Result<SiteOutcome, SiteError> {
        let slug = slugify_url(url);
        info!(url = %url, slug = %slug, "Checking site.");

        let prior = self
            .store
            .load_record(&slug)
            .await
            .map_err(SiteError::Load)?
            .map(|text| PriorRecord::parse(&text));
        let previous = prior
            .as_ref()
            .map(PriorRecord::status)
            .unwrap_or(SiteStatus::Unknown);
        let start_time = prior
            .and_then(|p| p.start_time)
            .unwrap_or_else(|| format_rfc1123(&Utc::now()));

        let probe = self.prober.probe(url).await;
        let current = probe.status();
        info!(
            url = %url,
            code = probe.http_code,
            response_time_ms = probe.elapsed_ms,
            status = %current,
            "Probe result."
        );

        let mut outcome = SiteOutcome {
            url: url.to_string(),
            slug,
            previous,
            current,
            probe,
            start_time,
            commit: None,
            delta: false,
            ticket: None,
        };
        let changed = previous != current;
        if mode == RunMode::Changes && !changed {
            info!(url = %url, status = %current, "Skipping commit, status is unchanged.");
            return Ok(outcome);
        }

        let commit = self.write_record(&outcome).await?;
        outcome.delta = changed;
        if changed {
            info!(url = %url, from = %previous, to = %current, "Status is different.");
            outcome.ticket = self.update_ticket(&outcome, &commit).await;
        } else {
            info!(url = %url, status = %current, "Status is the same.");
        }
        outcome.commit = Some(commit);
        Ok(outcome)
    }

    async fn write_record(&self, outcome: &SiteOutcome) -> Result<CommitRef, SiteError> {
        let record = HistoryRecord {
            url: outcome.url.clone(),
            status: outcome.current,
            code: outcome.probe.http_code,
            response_time_ms: outcome.probe.elapsed_ms,
            last_updated: Utc::now(),
            start_time: outcome.start_time.clone(),
        };
        let path = self.store.record_path(&outcome.slug);
        let version = self
            .store
            .file_version(&path)
            .await
            .map_err(SiteError::Version)?;
        let message = format!(
            "{} {} is {} ({} in {}ms) [skip ci]",
            outcome.current.emoji(),
            outcome.url,
            outcome.current,
            outcome.probe.http_code,
            outcome.probe.elapsed_ms
        );

        let commit = self
            .store
            .write_file(&path, &record.render(), &message, version.as_deref())
            .await
            .map_err(SiteError::Write)?;
        info!(url = %outcome.url, path = %path, commit = %commit.short_sha(), "Wrote status record.");
        Ok(commit)
    }

    async fn update_ticket(&self, outcome: &SiteOutcome, commit: &CommitRef) -> Option<TicketAction> {
        let transition = Transition {
            url: &outcome.url,
            slug: &outcome.slug,
            previous: outcome.previous,
            current: outcome.current,
            probe: outcome.probe,
            commit,
        };
        match self.tickets.on_transition(&transition).await {
            Ok(action) => Some(action),
            Err(e) => {
                warn!(url = %outcome.url, stage = "ticket", error = %e, "Failed to update ticket; continuing.");
                None
            }
        }
    }
}
