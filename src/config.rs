//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::messages::Locale;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_FILE: &str = ".coursehub/session.json";

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: Timeouts,
    pub session_file: PathBuf,
    pub locale: Locale,
}

impl ClientConfig {
    /// Config pointing at `base_url` with every other field defaulted.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            timeouts: Timeouts::default(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            locale: Locale::default(),
        }
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `COURSEHUB_BASE_URL`: default `http://127.0.0.1:8080/api`
    /// - `COURSEHUB_REQUEST_TIMEOUT_SECS`: default 15
    /// - `COURSEHUB_CONNECT_TIMEOUT_SECS`: default 10
    /// - `COURSEHUB_SESSION_FILE`: default `.coursehub/session.json`
    /// - `COURSEHUB_LOCALE`: `en` (default) or `zh-CN`
    ///
    /// # Errors
    ///
    /// Returns an error if the locale is unknown or a timeout is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("COURSEHUB_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeouts = Timeouts {
            request_secs: env_parse_u64("COURSEHUB_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("COURSEHUB_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        if timeouts.request_secs == 0 || timeouts.connect_secs == 0 {
            return Err(ConfigError::Parse("timeouts must be greater than zero".into()));
        }
        let session_file = std::env::var("COURSEHUB_SESSION_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);
        let locale = parse_locale(std::env::var("COURSEHUB_LOCALE").ok().as_deref())?;

        Ok(Self { base_url: normalize_base_url(&base_url), timeouts, session_file, locale })
    }

    /// Replace the base URL, normalized the same way as the env value.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    /// Join an endpoint path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn parse_locale(raw: Option<&str>) -> Result<Locale, ConfigError> {
    match raw.map(str::trim).unwrap_or("en") {
        "" | "en" | "en-US" => Ok(Locale::En),
        "zh" | "zh-CN" | "zh_CN" => Ok(Locale::ZhCn),
        other => Err(ConfigError::Parse(format!("unknown COURSEHUB_LOCALE: {other}"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
