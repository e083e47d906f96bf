//! stockpush enrichment
//!
//! Fills each discovered [`ImageRecord`](sp_record::ImageRecord) with
//! metadata, a caption and stock keywords:
//! - [`Captioner`] / [`ReplicateCaptioner`]: image to one-line description
//! - [`KeywordExtractor`]: description to keywords via a structured completion
//! - [`EnrichmentPipeline`]: the ordered per-record chain, run concurrently
//!   across a batch under per-step [`StepPolicy`] rules
//!
//! # Example
//!
//! ```rust,ignore
//! use sp_completion::{OpenAiConfig, OpenAiTransport, StructuredCompletionClient};
//! use sp_enrich::{EnrichmentPipeline, KeywordExtractor, ReplicateCaptioner, ReplicateConfig};
//!
//! let captioner = ReplicateCaptioner::new(ReplicateConfig::from_env()?)?;
//! let client = StructuredCompletionClient::new(OpenAiTransport::new(OpenAiConfig::from_env()?)?);
//! let pipeline = EnrichmentPipeline::new(captioner, KeywordExtractor::new(client));
//!
//! let report = pipeline.enrich(records).await;
//! for line in report.summary_lines() {
//!     println!("{line}");
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod caption;
pub mod error;
pub mod keywords;
pub mod pipeline;
pub mod policy;
pub mod replicate;
pub mod report;

pub use caption::Captioner;
pub use error::{CaptionError, KeywordError, Step, StepError};
pub use keywords::{KeywordConfig, KeywordExtractor, KeywordPayload};
pub use pipeline::EnrichmentPipeline;
pub use policy::{MissingDescription, PipelineConfig, StepPolicies, StepPolicy};
pub use replicate::{ReplicateCaptioner, ReplicateConfig};
pub use report::{BatchCounts, BatchReport, RecordOutcome, RecordStatus, StepFailure};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
