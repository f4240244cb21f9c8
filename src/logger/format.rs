//! Request log line format module
//!
//! Supports two formats:
//! - `plain`: `[2026-10-18T09:30:00.123Z] GET /productos?id=1 200 - detail`
//! - `json`: one JSON object per line

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::LogFormat;

/// One handled request
#[derive(Debug, Clone)]
pub struct RequestLogEntry {
    pub time: DateTime<Utc>,
    pub method: String,
    /// Path including the query string
    pub path: String,
    pub status: u16,
    pub detail: Option<String>,
}

impl RequestLogEntry {
    /// Create a new entry stamped with the current time
    pub fn new(method: impl Into<String>, path: impl Into<String>, status: u16) -> Self {
        Self {
            time: Utc::now(),
            method: method.into(),
            path: path.into(),
            status,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    /// Format the entry as a single line (no trailing newline)
    pub fn format(&self, format: LogFormat) -> String {
        match format {
            LogFormat::Plain => self.format_plain(),
            LogFormat::Json => self.format_json(),
        }
    }

    fn timestamp(&self) -> String {
        self.time.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn format_plain(&self) -> String {
        let mut line = format!(
            "[{}] {} {} {}",
            self.timestamp(),
            self.method,
            self.path,
            self.status
        );
        if let Some(detail) = &self.detail {
            // Keep one entry per line
            line.push_str(" - ");
            line.push_str(&detail.replace(['\r', '\n'], " "));
        }
        line
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "time": self.timestamp(),
            "method": self.method,
            "path": self.path,
            "status": self.status,
            "detail": self.detail,
        })
        .to_string()
    }
}
