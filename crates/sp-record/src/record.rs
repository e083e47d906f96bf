//! The image record carried through every stage of a batch

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One discovered image plus everything learned about it during a run
///
/// Created by discovery, filled in place by the enrichment steps and handed
/// read-only to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// File name, unique within a batch
    pub file_name: String,
    /// Directory the file was discovered in
    pub source_dir: PathBuf,
    /// Pixel width, set by metadata extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height, set by metadata extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// File size in bytes, set by metadata extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
    /// Caption produced by the vision service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Keywords produced by the completion service, in service order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl ImageRecord {
    /// Create a bare record for a discovered file
    #[inline]
    #[must_use]
    pub fn new(file_name: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            source_dir: source_dir.into(),
            width: None,
            height: None,
            byte_size: None,
            description: None,
            keywords: None,
        }
    }

    /// Full path of the image on disk
    #[inline]
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.source_dir.join(&self.file_name)
    }

    /// A record may be uploaded only once it has both a caption and keywords
    #[inline]
    #[must_use]
    pub fn is_upload_eligible(&self) -> bool {
        self.description.is_some() && self.keywords.is_some()
    }

    /// Whether dimensions and size are all known
    #[inline]
    #[must_use]
    pub fn has_metadata(&self) -> bool {
        self.width.is_some() && self.height.is_some() && self.byte_size.is_some()
    }

    /// MIME type guessed from the file extension
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        mime_for(Path::new(&self.file_name))
    }

    /// File size in mebibytes with two decimals, or `-` when unknown
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_mb(&self) -> String {
        match self.byte_size {
            Some(bytes) => format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0)),
            None => "-".to_string(),
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Encode raw image bytes as a `data:` URI
#[must_use]
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64_STANDARD.encode(bytes))
}
