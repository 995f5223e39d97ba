//! Display helpers for timestamps, sizes and submission states.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::messages::Locale;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const DISPLAY_DATE: &str = "%Y-%m-%d %H:%M";
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Backend timestamp as `yyyy-MM-dd HH:mm`.
///
/// Zoned timestamps are shown in local time; zoneless ones are taken as
/// already local. Empty input gives an empty string and anything
/// unparseable passes through unchanged.
#[must_use]
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return zoned.with_timezone(&Local).format(DISPLAY_DATE).to_string();
    }
    if let Some(naive) = NAIVE_FORMATS.iter().find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok()) {
        return naive.format(DISPLAY_DATE).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d 00:00").to_string();
    }
    tracing::debug!(raw, "unrecognized timestamp; shown as-is");
    raw.to_owned()
}

/// Human-readable byte count with two decimals (`1.50 KB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_owned();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", SIZE_UNITS[unit])
}

/// Lifecycle of a homework submission as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Submitted,
    Graded,
    Overdue,
}

impl SubmissionStatus {
    /// Parse the backend's status string, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "submitted" => Some(Self::Submitted),
            "graded" => Some(Self::Graded),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Self::Pending) => "not submitted",
            (Locale::En, Self::Submitted) => "submitted",
            (Locale::En, Self::Graded) => "graded",
            (Locale::En, Self::Overdue) => "overdue",
            (Locale::ZhCn, Self::Pending) => "待提交",
            (Locale::ZhCn, Self::Submitted) => "已提交",
            (Locale::ZhCn, Self::Graded) => "已评分",
            (Locale::ZhCn, Self::Overdue) => "已逾期",
        }
    }
}

/// Label for a raw status string; unknown statuses pass through unchanged.
#[must_use]
pub fn format_status(raw: &str, locale: Locale) -> String {
    SubmissionStatus::parse(raw).map_or_else(|| raw.to_owned(), |s| s.label(locale).to_owned())
}
