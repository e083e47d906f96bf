//! Saved browser session cookies
//!
//! Reads the JSON array produced by browser cookie exporters and turns each
//! entry into a WebDriver [`Cookie`].

use crate::driver::Cookie;
use crate::error::UploadError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    path: Option<String>,
    /// `-1` or `0` marks a session cookie
    #[serde(default)]
    expires: Option<f64>,
    #[serde(default)]
    http_only: bool,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    same_site: Option<String>,
}

impl From<ExportedCookie> for Cookie {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(exported: ExportedCookie) -> Self {
        Self {
            name: exported.name,
            value: exported.value,
            domain: exported.domain,
            path: exported.path,
            expiry: exported
                .expires
                .filter(|e| e.is_finite() && *e > 0.0)
                .map(|e| e as u64),
            http_only: exported.http_only,
            secure: exported.secure,
            same_site: exported.same_site,
        }
    }
}

/// Cookies restoring a signed-in session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    cookies: Vec<Cookie>,
}

impl SessionCookies {
    /// Wrap already converted cookies
    #[inline]
    #[must_use]
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self { cookies }
    }

    /// Read a cookie export file
    ///
    /// # Errors
    /// `UploadError::Session` if the file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let session_error = |message: String| UploadError::Session {
            path: path.to_path_buf(),
            message,
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| session_error(e.to_string()))?;
        let cookies = Self::parse(&text).map_err(|e| session_error(e.to_string()))?;
        tracing::debug!(path = %path.display(), cookies = cookies.len(), "session cookies loaded");
        Ok(cookies)
    }

    /// Parse a cookie export
    ///
    /// # Errors
    /// Returns the JSON error if `text` is not an array of cookies.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let exported: Vec<ExportedCookie> = serde_json::from_str(text)?;
        Ok(Self::new(exported.into_iter().map(Cookie::from).collect()))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }
}
