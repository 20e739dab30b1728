use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use statuswatch::alerting::TicketManager;
use statuswatch::config::{DEFAULT_CONFIG_PATH, load_config};
use statuswatch::github::GitHubClient;
use statuswatch::monitor::history::RepoHistory;
use statuswatch::monitor::{Prober, RunMode, StatusRunner};
use statuswatch::summary::{MarkdownSummary, regenerate_if_changed};

/// Probe the configured sites, commit status changes and manage down-tickets.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Pass `commit` to write a record for every site, changed or not.
    mode: Option<String>,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Also write JSON logs to a daily-rotated file in this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn init_logging(log_dir: Option<&PathBuf>) {
    let file_layer = log_dir.map(|dir| {
        fmt::layer()
            .with_writer(rolling::daily(dir, "statuswatch.log"))
            .with_ansi(false)
            .json()
    });

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info` level if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    dotenv::dotenv().ok();
    init_logging(cli.log_dir.as_ref());

    let mode = RunMode::from_arg(cli.mode.as_deref());
    info!(version = env!("CARGO_PKG_VERSION"), mode = ?mode, "Starting status run...");

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Critical error loading configuration. Exiting.");
            return Err(e.into());
        }
    };
    let token = config.token().inspect_err(|e| {
        error!(error = %e, "Critical error loading configuration. Exiting.");
    })?;
    let user_agent = config.user_agent();

    let client = || {
        GitHubClient::new(
            &config.api_base_url,
            &config.owner,
            &config.repo,
            &token,
            &user_agent,
        )
    };
    let store = Arc::new(RepoHistory::new(".", config.history_dir.clone(), client()?));
    let tickets = TicketManager::new(client()?, config.assignees.clone());
    let prober = Prober::new(&config.probe_settings())?;

    let runner = StatusRunner::new(prober, store.clone(), tickets)
        .with_concurrency(config.concurrency);
    let report = runner.run(&config.sites, mode).await;

    let summary = MarkdownSummary::new(store, config.summary_path.clone())?;
    if let Err(e) = regenerate_if_changed(&report, &summary).await {
        warn!(stage = "summary", error = %e, "Failed to regenerate summary.");
    }

    info!(
        sites = config.sites.len(),
        failures = report.failures.len(),
        "Status run complete."
    );
    Ok(())
}
