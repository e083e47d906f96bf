//! Error types for record discovery and metadata extraction

use std::path::PathBuf;

/// Errors raised while discovering or inspecting image files
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Source path is not a directory
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// IO error while reading the filesystem
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image header could not be decoded
    #[error("cannot read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Blocking worker was cancelled or panicked
    #[error("metadata worker failed: {0}")]
    Worker(String),
}

impl RecordError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
