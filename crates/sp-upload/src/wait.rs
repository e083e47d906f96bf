//! Polling waits for page elements

use crate::driver::{ElementRef, PageDriver};
use crate::error::UploadError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long and how often to look for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl WaitConfig {
    /// Create wait settings
    #[inline]
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            poll_interval_ms: u64::try_from(poll_interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Poll `selector` until it matches or the timeout elapses
///
/// The page is checked once immediately, then every poll interval.
///
/// # Errors
/// - `UploadError::Timeout` when the element never appears
/// - `UploadError::Driver` if a lookup itself fails
pub async fn wait_for<D>(
    driver: &D,
    step: &str,
    selector: &str,
    config: &WaitConfig,
) -> Result<ElementRef, UploadError>
where
    D: PageDriver + ?Sized,
{
    poll(driver, step, selector, config, true)
        .await?
        .ok_or_else(|| UploadError::MissingElement {
            step: step.to_string(),
            selector: selector.to_string(),
        })
}

/// Poll `selector` until nothing matches it or the timeout elapses
///
/// Returns at once when the element is already absent.
///
/// # Errors
/// - `UploadError::Timeout` when the element is still there at the timeout
/// - `UploadError::Driver` if a lookup itself fails
pub async fn wait_gone<D>(
    driver: &D,
    step: &str,
    selector: &str,
    config: &WaitConfig,
) -> Result<(), UploadError>
where
    D: PageDriver + ?Sized,
{
    poll(driver, step, selector, config, false).await.map(drop)
}

async fn poll<D>(
    driver: &D,
    step: &str,
    selector: &str,
    config: &WaitConfig,
    present: bool,
) -> Result<Option<ElementRef>, UploadError>
where
    D: PageDriver + ?Sized,
{
    let timeout = config.timeout();
    let interval = config.poll_interval();
    let started = tokio::time::Instant::now();

    loop {
        let found = driver
            .find(selector)
            .await
            .map_err(|e| UploadError::driver(step, e))?;
        if found.is_some() == present {
            tracing::trace!(step, selector, present, waited = ?started.elapsed(), "element settled");
            return Ok(found);
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(UploadError::Timeout {
                step: step.to_string(),
                selector: selector.to_string(),
                waited,
            });
        }
        tokio::time::sleep(interval.min(timeout - waited)).await;
    }
}

/// Find an element that must already be present
///
/// # Errors
/// `UploadError::MissingElement` if nothing matches.
pub async fn require<D>(driver: &D, step: &str, selector: &str) -> Result<ElementRef, UploadError>
where
    D: PageDriver + ?Sized,
{
    driver
        .find(selector)
        .await
        .map_err(|e| UploadError::driver(step, e))?
        .ok_or_else(|| UploadError::MissingElement {
            step: step.to_string(),
            selector: selector.to_string(),
        })
}
