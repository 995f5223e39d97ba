//! Binary responses and filename extraction.

#[cfg(test)]
#[path = "download_test.rs"]
mod download_test;

use std::path::{Path, PathBuf};

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};

/// A successful binary response, untouched by the pipeline.
#[derive(Debug, Clone)]
pub struct BinaryResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl BinaryResponse {
    /// Filename announced by `Content-Disposition`, reduced to a bare file
    /// name with no directory components.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        let raw = self.headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
        content_disposition_filename(raw)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }

    /// Write the body into `dir`, named after [`Self::filename`] or `fallback`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, dir: &Path, fallback: &str) -> std::io::Result<PathBuf> {
        let name = self.filename().unwrap_or_else(|| fallback.to_owned());
        let path = dir.join(name);
        std::fs::write(&path, &self.body)?;
        Ok(path)
    }
}

/// Parse the filename out of a `Content-Disposition` header value.
///
/// `filename*=UTF-8''…` wins over `filename=`. Both forms are
/// percent-decoded since the backend encodes the plain form as well.
#[must_use]
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in header.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = Some(strip_charset(value.trim())),
            "filename" => plain = Some(value.trim().trim_matches('"')),
            _ => {}
        }
    }
    let raw = extended.or(plain)?;
    let decoded = urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), std::borrow::Cow::into_owned);
    sanitize(&decoded)
}

/// Drop the `charset'lang'` prefix of an RFC 5987 value.
fn strip_charset(value: &str) -> &str {
    let value = value.trim_matches('"');
    match value.find("''") {
        Some(idx) => &value[idx + 2..],
        None => value,
    }
}

fn sanitize(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_owned())
}
