//! Error types for structured completions
//!
//! Two kinds of attempt failure are kept apart so each can carry its own
//! retry policy:
//! - transport failures (network, rate limit, server error)
//! - malformed replies (missing function call, bad JSON, schema mismatch)

/// Failure talking to the completion service
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Request could not be sent or the connection failed
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Reply body was not the expected envelope
    #[error("cannot decode service reply: {0}")]
    Decode(String),
}

impl TransportError {
    /// Check if a retry can reasonably succeed
    ///
    /// Client errors (4xx) other than 408 and 429 are not retryable.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => !err.is_builder(),
            Self::Status { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            Self::Decode(_) => true,
        }
    }

    /// HTTP status, when the service answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Status { status, .. } => Some(*status),
            Self::Decode(_) => None,
        }
    }
}

/// Why a single attempt did not produce a usable value
#[derive(Debug, thiserror::Error)]
pub enum AttemptFailure {
    /// The request never produced a reply
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The reply did not carry schema-conformant JSON
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl AttemptFailure {
    /// Check if this is a malformed-reply failure
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Terminal completion errors
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Request violates a precondition; never sent
    #[error("invalid completion request: {0}")]
    InvalidRequest(String),

    /// Every attempt in the retry budget failed
    #[error("maximum retries reached after {attempts} attempts: {last}")]
    MaxRetriesExceeded {
        /// Attempts made
        attempts: u32,
        /// Failure of the final attempt
        #[source]
        last: AttemptFailure,
    },

    /// Service rejected the request with a non-retryable error
    #[error("completion rejected: {0}")]
    Rejected(#[source] TransportError),

    /// Client configuration is incomplete
    #[error("configuration error: {0}")]
    Config(String),
}

impl CompletionError {
    /// Check if the retry budget was exhausted
    #[inline]
    #[must_use]
    pub fn is_max_retries(&self) -> bool {
        matches!(self, Self::MaxRetriesExceeded { .. })
    }
}
