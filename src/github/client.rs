use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use reqwest::{Client, Method, RequestBuilder, Response, header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CommitRef, GitHubError, Issue, NewIssue};

const API_VERSION: &str = "2022-11-28";

/// Talks to one repository through the GitHub REST API.
pub struct GitHubClient {
    client: Client,
    base_url: String,
    owner: String,
    repo: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: String,
}

#[derive(Serialize)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutContentResponse {
    commit: CommitRef,
}

#[derive(Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct UpdateIssueRequest<'a> {
    state: &'a str,
}

impl GitHubClient {
    pub fn new(
        base_url: &str,
        owner: &str,
        repo: &str,
        token: &str,
        user_agent: &str,
    ) -> Result<Self, GitHubError> {
        let mut auth = header::HeaderValue::from_str(&format!("token {token}")).map_err(|e| {
            GitHubError::InvalidConfiguration(format!("Invalid token header value: {e}"))
        })?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            header::HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    fn repo_path(&self, tail: &str) -> String {
        format!(
            "/repos/{}/{}/{}",
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo),
            tail
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    async fn check(
        response: Response,
        method: &'static str,
        path: &str,
    ) -> Result<Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(GitHubError::ApiStatus {
            method,
            path: path.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    /// Blob sha of a file (its version token); `Ok(None)` when it does not
    /// exist yet.
    pub async fn file_sha(&self, file_path: &str) -> Result<Option<String>, GitHubError> {
        let path = self.repo_path(&format!("contents/{}", encode_path(file_path)));
        let response = self.request(Method::GET, &path).send().await?;
        let response = match Self::check(response, "GET", &path).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                debug!(path = %file_path, "File does not exist in repository.");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let body: ContentResponse = response.json().await?;
        Ok(Some(body.sha))
    }

    /// Creates or updates a file. Passing the previous blob sha makes the
    /// write conditional on nobody having changed the file in between.
    pub async fn put_file(
        &self,
        file_path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<CommitRef, GitHubError> {
        let path = self.repo_path(&format!("contents/{}", encode_path(file_path)));
        let payload = PutContentRequest {
            message,
            content: BASE64_ENGINE.encode(content),
            sha,
        };
        let response = self
            .request(Method::PUT, &path)
            .json(&payload)
            .send()
            .await?;
        let response = Self::check(response, "PUT", &path).await?;
        let body: PutContentResponse = response.json().await?;
        Ok(body.commit)
    }

    /// Newest open issue carrying `label`, if any.
    pub async fn latest_open_issue(&self, label: &str) -> Result<Option<Issue>, GitHubError> {
        let path = self.repo_path("issues");
        let response = self
            .request(Method::GET, &path)
            .query(&[
                ("labels", label),
                ("filter", "all"),
                ("state", "open"),
                ("sort", "created"),
                ("direction", "desc"),
                ("per_page", "1"),
            ])
            .send()
            .await?;
        let response = Self::check(response, "GET", &path).await?;
        let issues: Vec<Issue> = response.json().await?;
        Ok(issues.into_iter().next())
    }

    pub async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, GitHubError> {
        let path = self.repo_path("issues");
        let response = self.request(Method::POST, &path).json(issue).send().await?;
        let response = Self::check(response, "POST", &path).await?;
        Ok(response.json().await?)
    }

    pub async fn create_comment(&self, number: u64, body: &str) -> Result<(), GitHubError> {
        let path = self.repo_path(&format!("issues/{number}/comments"));
        let response = self
            .request(Method::POST, &path)
            .json(&CommentRequest { body })
            .send()
            .await?;
        Self::check(response, "POST", &path).await?;
        Ok(())
    }

    pub async fn close_issue(&self, number: u64) -> Result<(), GitHubError> {
        let path = self.repo_path(&format!("issues/{number}"));
        let response = self
            .request(Method::PATCH, &path)
            .json(&UpdateIssueRequest { state: "closed" })
            .send()
            .await?;
        Self::check(response, "PATCH", &path).await?;
        Ok(())
    }
}

fn encode_path(file_path: &str) -> String {
    file_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
