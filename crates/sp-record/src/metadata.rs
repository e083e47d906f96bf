//! Dimension and file-size extraction

use crate::error::RecordError;
use crate::record::{data_uri, ImageRecord};

/// Dimensions and size of one image file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// File size in bytes
    pub byte_size: u64,
}

/// Read dimensions and size of a record's file
///
/// Only the image header is decoded; this runs on tokio's blocking pool.
///
/// # Errors
/// - `RecordError::Image` if the header cannot be decoded
/// - `RecordError::Io` if the file cannot be stat'ed
pub async fn read_metadata(record: &ImageRecord) -> Result<ImageMetadata, RecordError> {
    let path = record.path();

    let header_path = path.clone();
    let (width, height) = tokio::task::spawn_blocking(move || {
        image::image_dimensions(&header_path).map_err(|source| RecordError::Image {
            path: header_path,
            source,
        })
    })
    .await
    .map_err(|e| RecordError::Worker(e.to_string()))??;

    let stats = tokio::fs::metadata(&path)
        .await
        .map_err(|e| RecordError::io(&path, e))?;

    Ok(ImageMetadata {
        width,
        height,
        byte_size: stats.len(),
    })
}

/// Read metadata and store it on the record
///
/// On error the record is left untouched.
///
/// # Errors
/// Same as [`read_metadata`].
pub async fn apply_metadata(record: &mut ImageRecord) -> Result<ImageMetadata, RecordError> {
    let meta = read_metadata(record).await?;
    record.width = Some(meta.width);
    record.height = Some(meta.height);
    record.byte_size = Some(meta.byte_size);

    tracing::info!(
        file = %record.file_name,
        width = meta.width,
        height = meta.height,
        size = %record.size_mb(),
        "image metadata"
    );
    Ok(meta)
}

/// Read a record's file and wrap it as a base64 `data:` URI
///
/// # Errors
/// `RecordError::Io` if the file cannot be read.
pub async fn load_data_uri(record: &ImageRecord) -> Result<String, RecordError> {
    let path = record.path();
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| RecordError::io(&path, e))?;
    Ok(data_uri(record.mime_type(), &bytes))
}
