//! Transport seam between the retrying client and a concrete service

use crate::error::TransportError;
use crate::request::{CompletionReply, CompletionRequest};
use std::sync::Arc;

/// Sends one completion request, with no retry of its own
#[async_trait::async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Issue the request and return the raw reply
    async fn send(&self, request: &CompletionRequest) -> Result<CompletionReply, TransportError>;
}

#[async_trait::async_trait]
impl<T: CompletionTransport + ?Sized> CompletionTransport for Arc<T> {
    async fn send(&self, request: &CompletionRequest) -> Result<CompletionReply, TransportError> {
        (**self).send(request).await
    }
}
