use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::monitor::history::DEFAULT_HISTORY_DIR;
use crate::monitor::probe::ProbeSettings;

pub const DEFAULT_CONFIG_PATH: &str = ".statusrc.yml";
pub const DEFAULT_USER_AGENT: &str = "KojBot";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("No GitHub token configured (set PAT, GH_PAT or GITHUB_TOKEN)")]
    MissingToken,
}

/// Contents of `.statusrc.yml`.
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusConfig {
    pub sites: Vec<String>,
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default, rename = "PAT")]
    pub pat: Option<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Repository-relative directory of the `<slug>.yml` records. Read from
    /// the local checkout, written through the contents API.
    #[serde(default = "default_history_dir")]
    pub history_dir: String,
    #[serde(default = "default_summary_path")]
    pub summary_path: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_history_dir() -> String {
    DEFAULT_HISTORY_DIR.to_string()
}

fn default_summary_path() -> String {
    "history/summary.md".to_string()
}

fn default_concurrency() -> usize {
    1
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    3
}

// Keeps the token out of logs.
impl fmt::Debug for StatusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusConfig")
            .field("sites", &self.sites)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("user_agent", &self.user_agent)
            .field("pat", &self.pat.as_ref().map(|_| "<redacted>"))
            .field("assignees", &self.assignees)
            .field("api_base_url", &self.api_base_url)
            .field("history_dir", &self.history_dir)
            .field("summary_path", &self.summary_path)
            .field("concurrency", &self.concurrency)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

impl StatusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.trim().is_empty() {
            return Err(ConfigError::Invalid("`owner` must not be empty".to_string()));
        }
        if self.repo.trim().is_empty() {
            return Err(ConfigError::Invalid("`repo` must not be empty".to_string()));
        }
        if self.sites.is_empty() {
            return Err(ConfigError::Invalid(
                "`sites` must list at least one URL".to_string(),
            ));
        }
        if let Some(blank) = self.sites.iter().position(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("`sites[{blank}]` is empty")));
        }
        let history_dir = Path::new(&self.history_dir);
        let inside_repo = history_dir
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if self.history_dir.trim().is_empty() || !inside_repo {
            return Err(ConfigError::Invalid(format!(
                "`historyDir` must be a plain relative path inside the repository, got `{}`",
                self.history_dir
            )));
        }
        Ok(())
    }

    /// Resolves the API token: `PAT`, then `GH_PAT`, then `GITHUB_TOKEN`.
    pub fn token(&self) -> Result<String, ConfigError> {
        self.token_with(|key| std::env::var(key).ok())
    }

    fn token_with<F>(&self, env: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.pat
            .clone()
            .or_else(|| env("GH_PAT"))
            .or_else(|| env("GITHUB_TOKEN"))
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent_with(|key| std::env::var(key).ok())
    }

    fn user_agent_with<F>(&self, env: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        self.user_agent
            .clone()
            .or_else(|| env("USER_AGENT"))
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds.max(1)),
            timeout: Duration::from_secs(self.timeout_seconds.max(1)),
            max_redirects: self.max_redirects,
            user_agent: self.user_agent(),
        }
    }
}

/// Reads and validates the status config. YAML unless the path ends in `.toml`.
pub fn load_config(config_path_str: &str) -> Result<StatusConfig, ConfigError> {
    let config_path = Path::new(config_path_str);
    info!(path = %config_path.display(), "Attempting to load config.");

    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        error!(path = %config_path_str, error = %e, "Failed to read status config file.");
        ConfigError::Read {
            path: config_path_str.to_string(),
            source: e,
        }
    })?;

    let config = parse_config(&config_str, config_path).map_err(|e| {
        error!(path = %config_path_str, error = %e, "Failed to parse status config file.");
        e
    })?;
    config.validate()?;

    info!(config = ?config, "Loaded config successfully.");
    Ok(config)
}

fn parse_config(raw: &str, path: &Path) -> Result<StatusConfig, ConfigError> {
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        Ok(toml::from_str(raw)?)
    } else {
        Ok(serde_yaml::from_str(raw)?)
    }
}
