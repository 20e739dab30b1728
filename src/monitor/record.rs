//! The `history/<slug>.yml` record format.
//!
//! Records are a flat list of `- key: value` lines in a fixed order:
//!
//! ```text
//! - url: https://example.com
//! - status: up
//! - code: 200
//! - responseTime: 87
//! - lastUpdated: 2026-10-19T08:00:00.000Z
//! - startTime: Mon, 19 Oct 2026 07:55:00 GMT
//! ```
//!
//! Readers match keys case-insensitively and take everything after the
//! first `:` as the value, so values may themselves contain colons.
use chrono::{DateTime, SecondsFormat, Utc};

use super::status::SiteStatus;

/// A record about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub url: String,
    pub status: SiteStatus,
    pub code: u16,
    pub response_time_ms: u64,
    pub last_updated: DateTime<Utc>,
    /// Kept verbatim from the prior record so the streak start survives rewrites.
    pub start_time: String,
}

impl HistoryRecord {
    pub fn render(&self) -> String {
        format!(
            "- url: {}\n- status: {}\n- code: {}\n- responseTime: {}\n- lastUpdated: {}\n- startTime: {}\n",
            self.url,
            self.status,
            self.code,
            self.response_time_ms,
            format_iso8601(&self.last_updated),
            self.start_time
        )
    }
}

/// Fields recovered from an existing record. Every field is optional since
/// older or hand-edited files may lack some of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorRecord {
    pub url: Option<String>,
    pub status: Option<SiteStatus>,
    pub code: Option<u16>,
    pub response_time_ms: Option<u64>,
    pub last_updated: Option<String>,
    pub start_time: Option<String>,
}

impl PriorRecord {
    pub fn parse(text: &str) -> Self {
        let mut record = PriorRecord::default();
        for line in text.lines() {
            let Some((key, value)) = split_line(line) else {
                continue;
            };
            match key.to_ascii_lowercase().as_str() {
                "url" => record.url = Some(value.to_string()),
                "status" => record.status = value.parse().ok(),
                "code" => record.code = value.parse().ok(),
                "responsetime" => record.response_time_ms = value.parse().ok(),
                "lastupdated" => record.last_updated = Some(value.to_string()),
                "starttime" => record.start_time = Some(value.to_string()),
                _ => {}
            }
        }
        record
    }

    pub fn status(&self) -> SiteStatus {
        self.status.unwrap_or(SiteStatus::Unknown)
    }
}

fn split_line(line: &str) -> Option<(&str, &str)> {
    let body = line.trim().strip_prefix('-')?.trim_start();
    let (key, value) = body.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some((key.trim(), value))
}

/// `2026-10-19T08:00:00.000Z`
pub fn format_iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `Mon, 19 Oct 2026 08:00:00 GMT`
pub fn format_rfc1123(at: &DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    #[test]
    fn renders_fixed_field_order() {
        let record = HistoryRecord {
            url: "https://example.com".to_string(),
            status: SiteStatus::Down,
            code: 503,
            response_time_ms: 120,
            last_updated: sample_time(),
            start_time: "Mon, 19 Oct 2026 07:55:00 GMT".to_string(),
        };

        assert_eq!(
            record.render(),
            "- url: https://example.com\n\
             - status: down\n\
             - code: 503\n\
             - responseTime: 120\n\
             - lastUpdated: 2026-10-19T08:00:00.000Z\n\
             - startTime: Mon, 19 Oct 2026 07:55:00 GMT\n"
        );
    }

    #[test]
    fn parses_values_containing_colons() {
        let parsed = PriorRecord::parse(
            "- url: https://example.com:8443/x\n\
             - status: up\n\
             - code: 200\n\
             - responseTime: 87\n\
             - lastUpdated: 2026-10-19T08:00:00.000Z\n\
             - startTime: Mon, 19 Oct 2026 07:55:00 GMT\n",
        );

        assert_eq!(parsed.url.as_deref(), Some("https://example.com:8443/x"));
        assert_eq!(parsed.status(), SiteStatus::Up);
        assert_eq!(parsed.code, Some(200));
        assert_eq!(parsed.response_time_ms, Some(87));
        assert_eq!(parsed.last_updated.as_deref(), Some("2026-10-19T08:00:00.000Z"));
        assert_eq!(
            parsed.start_time.as_deref(),
            Some("Mon, 19 Oct 2026 07:55:00 GMT")
        );
    }

    #[test]
    fn keys_match_case_insensitively() {
        let parsed = PriorRecord::parse("- STATUS: Down\n- StartTime: yesterday\n");
        assert_eq!(parsed.status(), SiteStatus::Down);
        assert_eq!(parsed.start_time.as_deref(), Some("yesterday"));
    }

    #[test]
    fn garbage_yields_unknown() {
        let parsed = PriorRecord::parse("not a record\n- status:\n");
        assert_eq!(parsed.status(), SiteStatus::Unknown);
        assert_eq!(parsed.start_time, None);
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(format_iso8601(&sample_time()), "2026-10-19T08:00:00.000Z");
        assert_eq!(format_rfc1123(&sample_time()), "Mon, 19 Oct 2026 08:00:00 GMT");
    }
}
