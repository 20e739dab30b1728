//! Status summary regenerated after runs that changed something.
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::monitor::RunReport;
use crate::monitor::history::StoreError;

pub mod markdown;

pub use markdown::MarkdownSummary;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Templating error: {0}")]
    TemplatingError(#[from] tera::Error),
    #[error("Failed to store summary: {0}")]
    StoreError(#[from] StoreError),
}

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(&self, report: &RunReport) -> Result<(), SummaryError>;
}

/// Calls `generator` once if any site changed status during the run.
/// Returns whether it ran.
pub async fn regenerate_if_changed<G>(report: &RunReport, generator: &G) -> Result<bool, SummaryError>
where
    G: SummaryGenerator + ?Sized,
{
    if !report.has_delta() {
        info!("No status changes; summary left as is.");
        return Ok(false);
    }
    generator.generate(report).await?;
    info!("Summary regenerated.");
    Ok(true)
}
