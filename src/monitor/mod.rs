//! Probing, history records and the per-run orchestration.
pub mod history;
pub mod probe;
pub mod record;
pub mod runner;
pub mod slug;
pub mod status;

pub use probe::{ProbeResult, ProbeSettings, Prober};
pub use record::HistoryRecord;
pub use runner::{RunMode, RunReport, SiteOutcome, StatusRunner};
pub use slug::slugify_url;
pub use status::SiteStatus;
