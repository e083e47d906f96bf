//! Folder scanning
//!
//! Lists the regular files of a single directory (no recursion) and turns
//! every file with a recognised image extension into a bare [`ImageRecord`].

use crate::error::RecordError;
use crate::record::ImageRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extensions accepted in [`ExtensionMatch::Observed`] mode, leading dot included
pub const OBSERVED_EXTENSIONS: &[&str] = &[".png", ".jpg", ".gif", ".jpeg", ".JPG"];

/// How file extensions are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionMatch {
    /// Exact match against [`OBSERVED_EXTENSIONS`]
    ///
    /// Only `.JPG` is accepted in upper case; `.PNG` or `.Jpeg` are not.
    #[default]
    Observed,
    /// png, jpg, jpeg and gif in any letter case
    CaseInsensitive,
}

impl ExtensionMatch {
    /// Check a file name against this rule
    #[must_use]
    pub fn accepts(self, file_name: &str) -> bool {
        let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        match self {
            Self::Observed => OBSERVED_EXTENSIONS
                .iter()
                .any(|observed| observed.strip_prefix('.') == Some(ext)),
            Self::CaseInsensitive => matches!(
                ext.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "gif"
            ),
        }
    }
}

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Folder holding the images to publish
    pub folder: PathBuf,
    /// Extension matching rule
    #[serde(default)]
    pub extensions: ExtensionMatch,
}

impl DiscoveryConfig {
    /// Create configuration for a folder
    #[inline]
    #[must_use]
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            extensions: ExtensionMatch::default(),
        }
    }

    /// With extension matching rule
    #[inline]
    #[must_use]
    pub fn with_extensions(mut self, extensions: ExtensionMatch) -> Self {
        self.extensions = extensions;
        self
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::new("./img/toUpload")
    }
}

/// Scan the configured folder for image files
///
/// Records come back sorted by file name so a batch is reproducible across
/// platforms whose directory listing order differs.
///
/// # Errors
/// - `RecordError::NotADirectory` if the folder is missing or a file
/// - `RecordError::Io` if the listing fails
pub async fn discover(config: &DiscoveryConfig) -> Result<Vec<ImageRecord>, RecordError> {
    let folder = &config.folder;
    let meta = tokio::fs::metadata(folder)
        .await
        .map_err(|_| RecordError::NotADirectory(folder.clone()))?;
    if !meta.is_dir() {
        return Err(RecordError::NotADirectory(folder.clone()));
    }

    let mut entries = tokio::fs::read_dir(folder)
        .await
        .map_err(|e| RecordError::io(folder, e))?;
    let mut records = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| RecordError::io(folder, e))?
    {
        // follows symlinks, unlike `DirEntry::file_type`
        let is_file = match tokio::fs::metadata(entry.path()).await {
            Ok(meta) => meta.is_file(),
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable entry");
                false
            }
        };
        if !is_file {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if !config.extensions.accepts(&file_name) {
            tracing::debug!(file = %file_name, "skipping non-image file");
            continue;
        }

        tracing::info!(file = %file_name, dir = %folder.display(), "image file");
        records.push(ImageRecord::new(file_name, folder.clone()));
    }

    records.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    tracing::info!(count = records.len(), "discovered images");
    Ok(records)
}
