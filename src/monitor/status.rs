use std::fmt;
use std::str::FromStr;

/// Up/down state of a monitored site as written to its history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteStatus {
    Up,
    Down,
    /// No usable prior record.
    Unknown,
}

impl SiteStatus {
    /// `up` iff 200 <= code < 400. A failed probe reports code 0 and is `down`.
    pub fn from_http_code(code: u16) -> Self {
        if (200..400).contains(&code) {
            SiteStatus::Up
        } else {
            SiteStatus::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Up => "up",
            SiteStatus::Down => "down",
            SiteStatus::Unknown => "unknown",
        }
    }

    /// Square emoji prefixed to record commit messages.
    pub fn emoji(&self) -> &'static str {
        match self {
            SiteStatus::Up => "🟩",
            SiteStatus::Down => "🟥",
            SiteStatus::Unknown => "⬜",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteStatus {
    type Err = std::convert::Infallible;

    /// Anything other than `up`/`down` reads as `unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "up" => SiteStatus::Up,
            "down" => SiteStatus::Down,
            _ => SiteStatus::Unknown,
        })
    }
}
