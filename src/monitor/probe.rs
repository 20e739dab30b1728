//! Single-shot HTTP reachability probe.
use reqwest::{Client, redirect};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::status::SiteStatus;

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub connect_timeout: Duration,
    /// Whole-request budget, body included.
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            max_redirects: 3,
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Outcome of one probe. Transport failures are `http_code == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub http_code: u16,
    pub elapsed_ms: u64,
}

impl ProbeResult {
    pub fn failed() -> Self {
        Self {
            http_code: 0,
            elapsed_ms: 0,
        }
    }

    pub fn status(&self) -> SiteStatus {
        SiteStatus::from_http_code(self.http_code)
    }
}

pub struct Prober {
    client: Client,
}

impl Prober {
    pub fn new(settings: &ProbeSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.timeout)
            .redirect(redirect::Policy::limited(settings.max_redirects))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Issues one GET and drains the body chunk by chunk without keeping it.
    /// Never fails: DNS, TCP, TLS, timeout and redirect-limit errors all come
    /// back as [`ProbeResult::failed`].
    pub async fn probe(&self, url: &str) -> ProbeResult {
        let start_time = Instant::now();
        let mut response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                log_transport_error(url, &e);
                return ProbeResult::failed();
            }
        };

        let http_code = response.status().as_u16();
        let mut body_bytes = 0usize;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => body_bytes += chunk.len(),
                Ok(None) => break,
                Err(e) => {
                    log_transport_error(url, &e);
                    return ProbeResult::failed();
                }
            }
        }

        let elapsed_ms = round_millis(start_time.elapsed());
        debug!(
            url = %url,
            code = http_code,
            response_time_ms = elapsed_ms,
            body_bytes,
            "Probe finished."
        );
        ProbeResult {
            http_code,
            elapsed_ms,
        }
    }
}

fn log_transport_error(url: &str, e: &reqwest::Error) {
    let reason = if e.is_timeout() {
        "timed out"
    } else if e.is_redirect() {
        "too many redirects"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    warn!(url = %url, stage = "probe", error = %e, "Probe {reason}; recording as down.");
}

fn round_millis(elapsed: Duration) -> u64 {
    ((elapsed.as_micros() + 500) / 1000) as u64
}
