//! Classified request failures.
//!
//! ERROR HANDLING
//! ==============
//! Every failed request ends up as exactly one [`ApiError`] variant. Only
//! `SessionExpired` carries a cross-component side effect (performed by the
//! HTTP wrapper before the error is returned); the rest are display-only.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::fmt;

use crate::messages::{self, Locale, Message};

use super::types::ErrorPayload;

/// Body of a non-2xx response after decoding.
#[derive(Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// No body was sent.
    Empty,
    /// Body parsed as the backend's `{message?, code?}` payload.
    Json(ErrorPayload),
    /// Body that is not a JSON error payload, passed through untouched.
    Raw(Vec<u8>),
}

impl ErrorBody {
    /// Decode raw error bytes.
    ///
    /// Blob-typed responses deliver the server's JSON error as opaque bytes;
    /// they are read as UTF-8 and parsed here. Anything that does not parse
    /// is logged and kept as [`ErrorBody::Raw`].
    #[must_use]
    pub fn decode(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }
        let parsed = std::str::from_utf8(&bytes)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<ErrorPayload>(text).map_err(|e| e.to_string()));
        match parsed {
            Ok(payload) => Self::Json(payload),
            Err(error) => {
                tracing::warn!(%error, len = bytes.len(), "error body is not a JSON error payload; passing through raw");
                Self::Raw(bytes)
            }
        }
    }

    /// Server-provided message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Json(payload) => payload.message.as_deref().filter(|m| !m.is_empty()),
            Self::Empty | Self::Raw(_) => None,
        }
    }
}

impl fmt::Debug for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Json(payload) => f.debug_tuple("Json").field(payload).finish(),
            Self::Raw(bytes) => write!(f, "Raw({} bytes)", bytes.len()),
        }
    }
}

/// Errors produced by [`super::http::ApiClient`] and the REST bindings.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response reached the client (connect failure, timeout, broken body).
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 401. The session has already been cleared when this is returned.
    #[error("session expired")]
    SessionExpired,

    /// HTTP 403.
    #[error("forbidden: {}", .body.message().unwrap_or("no message"))]
    Forbidden { body: ErrorBody },

    /// Any other non-2xx status.
    #[error("request failed with status {status}: {}", .body.message().unwrap_or("no message"))]
    RequestFailed { status: u16, body: ErrorBody },

    /// HTTP 2xx whose envelope reports a failure code.
    #[error("request rejected with code {code}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { code: i64, message: Option<String> },

    /// A 2xx body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status carried by this error, if it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::RequestFailed { status, .. } => Some(*status),
            Self::Network(_) | Self::Rejected { .. } | Self::Decode(_) | Self::HttpClientBuild(_) => None,
        }
    }

    /// Error body for status-classified failures.
    #[must_use]
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Forbidden { body } | Self::RequestFailed { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Text to show the user: the server's message when it sent one, else a
    /// localized default.
    #[must_use]
    pub fn user_message(&self, locale: Locale) -> String {
        let fallback = |message| messages::text(message, locale).to_owned();
        match self {
            Self::Network(_) => fallback(Message::NetworkError),
            Self::SessionExpired => fallback(Message::LoginExpired),
            Self::Forbidden { body } => body.message().map_or_else(|| fallback(Message::Forbidden), str::to_owned),
            Self::RequestFailed { body, .. } => {
                body.message().map_or_else(|| fallback(Message::RequestFailed), str::to_owned)
            }
            Self::Rejected { message, .. } => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .map_or_else(|| fallback(Message::RequestFailed), str::to_owned),
            Self::Decode(_) | Self::HttpClientBuild(_) => fallback(Message::RequestFailed),
        }
    }
}
