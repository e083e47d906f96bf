//! Browser page seam

use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Opaque handle to an element found on the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    /// Wrap a driver element id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Driver element id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Cookie in the shape WebDriver accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Seconds since the epoch; absent for session cookies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

/// One browser page
///
/// `find` never waits: it reports what is on the page right now and returns
/// `None` when nothing matches. Waiting is layered on top by
/// [`wait_for`](crate::wait::wait_for).
#[async_trait::async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Add a cookie for the current document's domain
    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), DriverError>;

    /// First element matching a CSS selector
    async fn find(&self, selector: &str) -> Result<Option<ElementRef>, DriverError>;

    /// Click an element
    async fn click(&self, element: &ElementRef) -> Result<(), DriverError>;

    /// Hand a local file to a file input
    async fn send_file(&self, element: &ElementRef, path: &Path) -> Result<(), DriverError>;

    /// End the browser session
    async fn close(&self) -> Result<(), DriverError>;
}

#[async_trait::async_trait]
impl<D: PageDriver + ?Sized> PageDriver for Arc<D> {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        (**self).goto(url).await
    }

    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), DriverError> {
        (**self).add_cookie(cookie).await
    }

    async fn find(&self, selector: &str) -> Result<Option<ElementRef>, DriverError> {
        (**self).find(selector).await
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        (**self).click(element).await
    }

    async fn send_file(&self, element: &ElementRef, path: &Path) -> Result<(), DriverError> {
        (**self).send_file(element, path).await
    }

    async fn close(&self) -> Result<(), DriverError> {
        (**self).close().await
    }
}
