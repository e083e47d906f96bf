//! Per-record outcomes and the batch report

use crate::error::{Step, StepError};
use serde::{Deserialize, Serialize};
use sp_record::ImageRecord;

/// Where a record ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Every step ran and succeeded
    Complete,
    /// Some steps failed or were skipped under a soft-fail policy
    Partial,
    /// A step configured to abort the record failed
    Failed,
}

/// A failed step, kept as text so reports serialize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: Step,
    pub message: String,
}

impl From<&StepError> for StepFailure {
    fn from(err: &StepError) -> Self {
        Self {
            step: err.step(),
            message: err.to_string(),
        }
    }
}

/// Result of enriching one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub record: ImageRecord,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StepFailure>,
    /// Steps not attempted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Step>,
}

impl RecordOutcome {
    /// Check whether a given step failed
    #[inline]
    #[must_use]
    pub fn failed_step(&self, step: Step) -> bool {
        self.failures.iter().any(|f| f.step == step)
    }
}

/// Status counts across a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub complete: usize,
    pub partial: usize,
    pub failed: usize,
    /// Records with both description and keywords
    pub eligible: usize,
}

/// Everything the pipeline learned about a batch, in completion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    /// Create report from outcomes
    #[inline]
    #[must_use]
    pub fn new(outcomes: Vec<RecordOutcome>) -> Self {
        Self { outcomes }
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Check if the batch was empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Every record, enriched or not
    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.outcomes.iter().map(|o| &o.record)
    }

    /// Records ready for upload
    pub fn eligible(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records().filter(|r| r.is_upload_eligible())
    }

    /// Outcome for a file name
    #[must_use]
    pub fn outcome(&self, file_name: &str) -> Option<&RecordOutcome> {
        self.outcomes.iter().find(|o| o.record.file_name == file_name)
    }

    /// Consume the report, keeping only the records
    #[must_use]
    pub fn into_records(self) -> Vec<ImageRecord> {
        self.outcomes.into_iter().map(|o| o.record).collect()
    }

    /// Status counts
    #[must_use]
    pub fn counts(&self) -> BatchCounts {
        let mut counts = BatchCounts::default();
        for outcome in &self.outcomes {
            match outcome.status {
                RecordStatus::Complete => counts.complete += 1,
                RecordStatus::Partial => counts.partial += 1,
                RecordStatus::Failed => counts.failed += 1,
            }
            if outcome.record.is_upload_eligible() {
                counts.eligible += 1;
            }
        }
        counts
    }

    /// Human readable per-image summary
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .enumerate()
            .map(|(index, outcome)| {
                let r = &outcome.record;
                let dim = |v: Option<u32>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
                let keywords = r
                    .keywords
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |k| k.join(", "));
                format!(
                    "[{}] {} | {}\n    Width: {}       Height: {}       Size: {}\n    Keywords: {}\n",
                    index + 1,
                    r.file_name,
                    r.source_dir.display(),
                    dim(r.width),
                    dim(r.height),
                    r.size_mb(),
                    keywords,
                )
            })
            .collect()
    }
}
