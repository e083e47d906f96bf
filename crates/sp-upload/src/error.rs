//! Error types for browser-driven uploads

use std::path::PathBuf;
use std::time::Duration;

/// A browser command failed
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Could not reach the driver endpoint
    #[error("driver http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The driver answered with a WebDriver error
    #[error("driver command failed with status {status}: {error}: {message}")]
    Command {
        status: u16,
        error: String,
        message: String,
    },

    /// The driver answered with something unreadable
    #[error("cannot decode driver response: {0}")]
    Decode(String),

    /// The session was already closed
    #[error("browser session is closed")]
    Closed,
}

impl DriverError {
    /// WebDriver error code, if the driver produced one
    #[inline]
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Command { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A step of an upload sequence failed
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// A browser command failed during `step`
    #[error("{step}: {source}")]
    Driver {
        step: String,
        #[source]
        source: DriverError,
    },

    /// An awaited element never appeared
    #[error("{step}: timed out after {waited:?} waiting for `{selector}`")]
    Timeout {
        step: String,
        selector: String,
        waited: Duration,
    },

    /// An element expected to be present was not
    #[error("{step}: no element matches `{selector}`")]
    MissingElement { step: String, selector: String },

    /// The image file to send could not be resolved on disk
    #[error("cannot locate {} for upload: {source}", path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The session cookie file could not be used
    #[error("cannot load session cookies from {}: {message}", path.display())]
    Session { path: PathBuf, message: String },
}

impl UploadError {
    /// Wrap a driver error with the step it interrupted
    #[inline]
    #[must_use]
    pub fn driver(step: impl Into<String>, source: DriverError) -> Self {
        Self::Driver {
            step: step.into(),
            source,
        }
    }

    /// Check if this is a wait timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Step that failed, where known
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::Driver { step, .. }
            | Self::Timeout { step, .. }
            | Self::MissingElement { step, .. } => Some(step),
            Self::LocalFile { .. } | Self::Session { .. } => None,
        }
    }
}
