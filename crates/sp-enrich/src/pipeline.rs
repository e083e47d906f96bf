//! Record enrichment pipeline
//!
//! Each record runs metadata → description → keywords, one step after the
//! other. Records run concurrently and every one of them yields an outcome;
//! no failure, whatever its policy, reaches a sibling record.

use crate::caption::Captioner;
use crate::error::{Step, StepError};
use crate::keywords::KeywordExtractor;
use crate::policy::{MissingDescription, PipelineConfig, StepPolicy};
use crate::report::{BatchReport, RecordOutcome, RecordStatus, StepFailure};
use futures::stream::{self, StreamExt};
use sp_completion::CompletionTransport;
use sp_record::{apply_metadata, load_data_uri, ImageRecord};

/// Runs the enrichment chain over a batch
#[derive(Debug)]
pub struct EnrichmentPipeline<C, T> {
    captioner: C,
    keywords: KeywordExtractor<T>,
    config: PipelineConfig,
}

impl<C, T> EnrichmentPipeline<C, T>
where
    C: Captioner,
    T: CompletionTransport,
{
    /// Create pipeline with default configuration
    #[inline]
    #[must_use]
    pub fn new(captioner: C, keywords: KeywordExtractor<T>) -> Self {
        Self {
            captioner,
            keywords,
            config: PipelineConfig::default(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enrich every record of a batch
    ///
    /// Outcomes come back in completion order, one per input record.
    pub async fn enrich(&self, records: Vec<ImageRecord>) -> BatchReport {
        let total = records.len();
        let limit = self.config.max_concurrency.unwrap_or(total).max(1);
        tracing::info!(records = total, limit, "enriching batch");

        let outcomes: Vec<RecordOutcome> = stream::iter(records)
            .map(|record| self.enrich_record(record))
            .buffer_unordered(limit)
            .collect()
            .await;

        let report = BatchReport::new(outcomes);
        let counts = report.counts();
        tracing::info!(
            complete = counts.complete,
            partial = counts.partial,
            failed = counts.failed,
            eligible = counts.eligible,
            "batch enriched"
        );
        report
    }

    /// Run the three steps for one record
    pub async fn enrich_record(&self, record: ImageRecord) -> RecordOutcome {
        let mut run = RecordRun::new(record);

        if let Err(err) = apply_metadata(&mut run.record).await {
            if run.fail(StepError::Metadata(err), &self.config) {
                return run.finish();
            }
        }

        match self.describe(&run.record).await {
            Ok(description) => {
                tracing::info!(file = %run.record.file_name, description = %description, "caption");
                run.record.description = Some(description);
            }
            Err(err) => {
                if run.fail(err, &self.config) {
                    return run.finish();
                }
            }
        }

        let subject = match (&run.record.description, &self.config.missing_description) {
            (Some(description), _) => Some(description.clone()),
            (None, MissingDescription::Placeholder(text)) => Some(text.clone()),
            (None, MissingDescription::Skip) => None,
        };

        match subject {
            None => {
                tracing::warn!(file = %run.record.file_name, "no description, skipping keywords");
                run.skipped.push(Step::Keywords);
            }
            Some(subject) => match self.keywords.extract(&subject).await {
                Ok(keywords) => {
                    tracing::info!(file = %run.record.file_name, keywords = %keywords.join("  "), "keywords");
                    run.record.keywords = Some(keywords);
                }
                Err(err) => {
                    run.fail(StepError::from(err), &self.config);
                }
            },
        }

        run.finish()
    }

    async fn describe(&self, record: &ImageRecord) -> Result<String, StepError> {
        let uri = load_data_uri(record).await.map_err(StepError::ImageRead)?;
        Ok(self.captioner.caption(&uri).await?)
    }
}

/// Accumulates one record's progress through the chain
struct RecordRun {
    record: ImageRecord,
    failures: Vec<StepFailure>,
    skipped: Vec<Step>,
    aborted: bool,
}

impl RecordRun {
    fn new(record: ImageRecord) -> Self {
        Self {
            record,
            failures: Vec::new(),
            skipped: Vec::new(),
            aborted: false,
        }
    }

    /// Record a failure; returns true when the chain must stop
    fn fail(&mut self, err: StepError, config: &PipelineConfig) -> bool {
        let step = err.step();
        let policy = config.policies.for_step(step);
        tracing::error!(file = %self.record.file_name, step = %step, error = %err, "enrichment step failed");
        self.failures.push(StepFailure::from(&err));

        if policy == StepPolicy::AbortRecord {
            self.aborted = true;
            self.skipped.extend(
                [Step::Metadata, Step::Description, Step::Keywords]
                    .into_iter()
                    .filter(|s| *s > step),
            );
        }
        self.aborted
    }

    fn finish(self) -> RecordOutcome {
        let status = if self.aborted {
            RecordStatus::Failed
        } else if self.failures.is_empty() && self.skipped.is_empty() {
            RecordStatus::Complete
        } else {
            RecordStatus::Partial
        };
        RecordOutcome {
            record: self.record,
            status,
            failures: self.failures,
            skipped: self.skipped,
        }
    }
}
