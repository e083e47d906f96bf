//! Error types for the enrichment pipeline

use serde::{Deserialize, Serialize};
use sp_completion::CompletionError;
use sp_record::RecordError;
use std::time::Duration;

/// Enrichment steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Dimensions and file size
    Metadata,
    /// Vision caption
    Description,
    /// Keyword extraction
    Keywords,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Metadata => "metadata",
            Self::Description => "description",
            Self::Keywords => "keywords",
        };
        f.write_str(name)
    }
}

/// Captioning service failures
#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    /// Request could not be sent
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("captioning service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Prediction finished without success
    #[error("prediction {status}: {message}")]
    Prediction { status: String, message: String },

    /// Prediction still running when the deadline passed
    #[error("prediction did not finish within {0:?}")]
    Timeout(Duration),

    /// Output could not be read as a caption
    #[error("cannot decode caption output: {0}")]
    Decode(String),

    /// Output was empty
    #[error("captioning service returned an empty caption")]
    EmptyOutput,

    /// Client configuration is incomplete
    #[error("configuration error: {0}")]
    Config(String),
}

/// Keyword step failures
#[derive(Debug, thiserror::Error)]
pub enum KeywordError {
    /// Completion client gave up
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// Response schema could not be generated
    #[error("cannot build keyword schema: {0}")]
    Schema(String),

    /// Validated payload did not decode into keywords
    #[error("cannot decode keyword payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One failed enrichment step
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Dimensions or size could not be read
    #[error("metadata extraction failed: {0}")]
    Metadata(#[source] RecordError),

    /// Image bytes could not be read for captioning
    #[error("cannot read image for captioning: {0}")]
    ImageRead(#[source] RecordError),

    /// Captioning service failed
    #[error("description generation failed: {0}")]
    Caption(#[from] CaptionError),

    /// Keyword extraction failed
    #[error("keyword extraction failed: {0}")]
    Keywords(#[from] KeywordError),
}

impl StepError {
    /// Step that produced this error
    #[inline]
    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            Self::Metadata(_) => Step::Metadata,
            Self::ImageRead(_) | Self::Caption(_) => Step::Description,
            Self::Keywords(_) => Step::Keywords,
        }
    }

    /// Check if the completion retry budget ran out
    #[inline]
    #[must_use]
    pub fn is_max_retries(&self) -> bool {
        matches!(
            self,
            Self::Keywords(KeywordError::Completion(err)) if err.is_max_retries()
        )
    }
}
