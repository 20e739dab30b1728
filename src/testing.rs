//! In-memory stand-ins for the GitHub-backed seams.
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::alerting::IssueTracker;
use crate::github::{CommitRef, GitHubError, Issue, NewIssue};
use crate::monitor::RunReport;
use crate::monitor::history::{DEFAULT_HISTORY_DIR, HistoryStore, StoreError, record_path};
use crate::summary::{SummaryError, SummaryGenerator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub path: String,
    pub content: String,
    pub message: String,
    pub version: Option<String>,
}

#[derive(Default)]
struct StoreState {
    files: HashMap<String, (String, String)>,
    writes: Vec<RecordedWrite>,
    next_sha: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    failing_paths: HashSet<String>,
}

impl MemoryStore {
    pub fn with_record(self, slug: &str, content: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_sha += 1;
            let sha = format!("blob{:036}", state.next_sha);
            state
                .files
                .insert(record_path(DEFAULT_HISTORY_DIR, slug), (content.to_string(), sha));
        }
        self
    }

    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|(content, _)| content.clone())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    fn record_path(&self, slug: &str) -> String {
        record_path(DEFAULT_HISTORY_DIR, slug)
    }

    async fn load_record(&self, slug: &str) -> Result<Option<String>, StoreError> {
        Ok(self.content(&self.record_path(slug)))
    }

    async fn file_version(&self, path: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|(_, sha)| sha.clone()))
    }

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        version: Option<&str>,
    ) -> Result<CommitRef, StoreError> {
        if self.failing_paths.contains(path) {
            return Err(StoreError::Remote(GitHubError::ApiStatus {
                method: "PUT",
                path: path.to_string(),
                status: 409,
                body: "sha mismatch".to_string(),
            }));
        }
        let mut state = self.state.lock().unwrap();
        state.next_sha += 1;
        let sha = format!("{:040x}", state.next_sha);
        state
            .files
            .insert(path.to_string(), (content.to_string(), sha.clone()));
        state.writes.push(RecordedWrite {
            path: path.to_string(),
            content: content.to_string(),
            message: message.to_string(),
            version: version.map(str::to_string),
        });
        Ok(CommitRef { sha })
    }
}

#[derive(Default)]
struct TrackerState {
    open: HashMap<String, u64>,
    created: Vec<NewIssue>,
    comments: Vec<(u64, String)>,
    closed: Vec<u64>,
    next_number: u64,
}

#[derive(Default)]
pub struct FakeTracker {
    state: Mutex<TrackerState>,
    failing: bool,
}

impl FakeTracker {
    pub fn with_open(label: &str, number: u64) -> Self {
        let tracker = Self::default();
        {
            let mut state = tracker.state.lock().unwrap();
            state.open.insert(label.to_string(), number);
            state.next_number = number;
        }
        tracker
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn created(&self) -> Vec<NewIssue> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn closed(&self) -> Vec<u64> {
        self.state.lock().unwrap().closed.clone()
    }

    pub fn mutations(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.created.len() + state.comments.len() + state.closed.len()
    }

    fn check(&self) -> Result<(), GitHubError> {
        if self.failing {
            return Err(GitHubError::ApiStatus {
                method: "GET",
                path: "/issues".to_string(),
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn latest_open_issue(&self, label: &str) -> Result<Option<Issue>, GitHubError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .open
            .get(label)
            .map(|number| Issue {
                number: *number,
                html_url: None,
            }))
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, GitHubError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.next_number += 1;
        let number = state.next_number;
        for label in issue.labels.iter().filter(|l| l.as_str() != "status") {
            state.open.insert(label.clone(), number);
        }
        state.created.push(issue.clone());
        Ok(Issue {
            number,
            html_url: Some(format!("https://github.com/koj-co/status/issues/{number}")),
        })
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), GitHubError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .comments
            .push((number, body.to_string()));
        Ok(())
    }

    async fn close_issue(&self, number: u64) -> Result<(), GitHubError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.open.retain(|_, n| *n != number);
        state.closed.push(number);
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingSummary {
    calls: AtomicUsize,
}

impl CountingSummary {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryGenerator for CountingSummary {
    async fn generate(&self, _report: &RunReport) -> Result<(), SummaryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
