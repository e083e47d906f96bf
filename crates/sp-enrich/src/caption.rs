//! Vision captioning seam

use crate::error::CaptionError;
use std::sync::Arc;

/// Produces a one-line description of an image
#[async_trait::async_trait]
pub trait Captioner: Send + Sync {
    /// Caption an image given as a base64 `data:` URI
    async fn caption(&self, image_data_uri: &str) -> Result<String, CaptionError>;
}

#[async_trait::async_trait]
impl<C: Captioner + ?Sized> Captioner for Arc<C> {
    async fn caption(&self, image_data_uri: &str) -> Result<String, CaptionError> {
        (**self).caption(image_data_uri).await
    }
}
