//! stockpush structured completions
//!
//! Obtains schema-conformant JSON from a generative text service:
//! - [`CompletionRequest`]: model, messages, forced function and limits
//! - [`CompletionTransport`]: one network round trip, no retry
//! - [`OpenAiTransport`]: chat-completions over reqwest
//! - [`StructuredCompletionClient`]: validation plus bounded retry
//!
//! # Example
//!
//! ```rust,ignore
//! use sp_completion::{
//!     ChatMessage, CompletionRequest, FunctionSchema, OpenAiConfig, OpenAiTransport,
//!     StructuredCompletionClient,
//! };
//!
//! let transport = OpenAiTransport::new(OpenAiConfig::from_env()?)?;
//! let client = StructuredCompletionClient::new(transport);
//!
//! let request = CompletionRequest::new("gpt-3.5-turbo-0613", FunctionSchema::new("tag", schema))
//!     .with_message(ChatMessage::user("Tag this photo: a red fox in snow"));
//! let value = client.complete(&request).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod error;
pub mod openai;
pub mod request;
pub mod retry;
pub mod transport;
pub mod validate;

pub use client::StructuredCompletionClient;
pub use error::{AttemptFailure, CompletionError, TransportError};
pub use openai::{OpenAiConfig, OpenAiTransport};
pub use request::{
    ChatMessage, CompletionReply, CompletionRequest, FunctionSchema, Role, TokenUsage,
};
pub use retry::{Backoff, RetryPolicy, DEFAULT_BACKOFF_STEP, DEFAULT_MAX_ATTEMPTS};
pub use transport::CompletionTransport;
pub use validate::{check_request, string_array_properties, ReplyValidator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
