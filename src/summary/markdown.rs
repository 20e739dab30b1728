use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::warn;

use super::{SummaryError, SummaryGenerator};
use crate::monitor::history::HistoryStore;
use crate::monitor::record::{PriorRecord, format_iso8601};
use crate::monitor::{RunReport, SiteOutcome, slugify_url};

const TEMPLATE_NAME: &str = "summary.md";
const TEMPLATE: &str = "\
# Status

| Site | Status | HTTP code | Response time | Since |
| ---- | ------ | --------- | ------------- | ----- |
{% for site in sites -%}
| [{{ site.url }}]({{ site.url }}) | {{ site.emoji }} {{ site.status }}{% if not site.checked %} (not checked){% endif %} | {{ site.code }} | {{ site.response_time }} | {{ site.since }} |
{% endfor %}
_Last updated {{ generated_at }}_
";

const MISSING: &str = "-";

#[derive(Serialize)]
struct SummaryRow {
    url: String,
    status: &'static str,
    emoji: &'static str,
    code: String,
    response_time: String,
    since: String,
    /// False when the site failed this run and the row shows its last record.
    checked: bool,
}

impl SummaryRow {
    fn probed(outcome: &SiteOutcome) -> Self {
        Self {
            url: outcome.url.clone(),
            status: outcome.current.as_str(),
            emoji: outcome.current.emoji(),
            code: outcome.probe.http_code.to_string(),
            response_time: format!("{} ms", outcome.probe.elapsed_ms),
            since: outcome.start_time.clone(),
            checked: true,
        }
    }

    fn last_known(url: &str, record: PriorRecord) -> Self {
        let status = record.status();
        Self {
            url: url.to_string(),
            status: status.as_str(),
            emoji: status.emoji(),
            code: record
                .code
                .map_or_else(|| MISSING.to_string(), |c| c.to_string()),
            response_time: record
                .response_time_ms
                .map_or_else(|| MISSING.to_string(), |ms| format!("{ms} ms")),
            since: record.start_time.unwrap_or_else(|| MISSING.to_string()),
            checked: false,
        }
    }
}

/// Renders a Markdown status table and commits it next to the records.
///
/// Sites that failed during the run are listed from their last stored record.
pub struct MarkdownSummary<S> {
    store: S,
    path: String,
    tera: Tera,
}

impl<S: HistoryStore> MarkdownSummary<S> {
    pub fn new(store: S, path: impl Into<String>) -> Result<Self, SummaryError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self {
            store,
            path: path.into(),
            tera,
        })
    }

    pub async fn render(&self, report: &RunReport) -> Result<String, SummaryError> {
        let mut rows: Vec<SummaryRow> = report.outcomes.iter().map(SummaryRow::probed).collect();
        for failure in &report.failures {
            rows.push(self.last_known_row(&failure.url).await);
        }

        let mut context = Context::new();
        context.insert("sites", &rows);
        context.insert("generated_at", &format_iso8601(&Utc::now()));
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }

    async fn last_known_row(&self, url: &str) -> SummaryRow {
        let record = match self.store.load_record(&slugify_url(url)).await {
            Ok(text) => text.map(|t| PriorRecord::parse(&t)).unwrap_or_default(),
            Err(e) => {
                warn!(url = %url, stage = "summary", error = %e, "Failed to load last record for summary row.");
                PriorRecord::default()
            }
        };
        SummaryRow::last_known(url, record)
    }
}

#[async_trait]
impl<S: HistoryStore> SummaryGenerator for MarkdownSummary<S> {
    async fn generate(&self, report: &RunReport) -> Result<(), SummaryError> {
        let content = self.render(report).await?;
        let version = self.store.file_version(&self.path).await?;
        self.store
            .write_file(
                &self.path,
                &content,
                "📝 Update status summary [skip ci]",
                version.as_deref(),
            )
            .await?;
        Ok(())
    }
}
