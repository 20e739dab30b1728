use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("GitHub API returned {status} for {method} {path}. Body: {body}")]
    ApiStatus {
        method: &'static str,
        path: String,
        status: u16,
        body: String,
    },
    #[error("Invalid client configuration: {0}")]
    InvalidConfiguration(String),
}

impl GitHubError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitHubError::ApiStatus { status: 404, .. })
    }
}
