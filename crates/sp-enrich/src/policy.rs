//! Failure policies and pipeline configuration

use crate::error::Step;
use serde::{Deserialize, Serialize};

/// What a failed step does to the rest of its record's chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Leave the field unset, record the failure, run the next step
    #[default]
    SoftFail,
    /// Stop this record's chain and mark the record failed
    AbortRecord,
}

/// Policy per enrichment step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPolicies {
    #[serde(default)]
    pub metadata: StepPolicy,
    #[serde(default)]
    pub description: StepPolicy,
    #[serde(default)]
    pub keywords: StepPolicy,
}

impl StepPolicies {
    /// Same policy for every step
    #[inline]
    #[must_use]
    pub fn uniform(policy: StepPolicy) -> Self {
        Self {
            metadata: policy,
            description: policy,
            keywords: policy,
        }
    }

    /// Policy for one step
    #[inline]
    #[must_use]
    pub fn for_step(&self, step: Step) -> StepPolicy {
        match step {
            Step::Metadata => self.metadata,
            Step::Description => self.description,
            Step::Keywords => self.keywords,
        }
    }

    /// Override one step
    #[inline]
    #[must_use]
    pub fn with(mut self, step: Step, policy: StepPolicy) -> Self {
        match step {
            Step::Metadata => self.metadata = policy,
            Step::Description => self.description = policy,
            Step::Keywords => self.keywords = policy,
        }
        self
    }
}

/// Keyword behaviour for records without a description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDescription {
    /// Do not request keywords; the record stays ineligible for upload
    #[default]
    Skip,
    /// Request keywords for this text instead
    Placeholder(String),
}

/// Enrichment pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub policies: StepPolicies,
    #[serde(default)]
    pub missing_description: MissingDescription,
    /// Records enriched at once; `None` runs the whole batch at once
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With step policies
    #[inline]
    #[must_use]
    pub fn with_policies(mut self, policies: StepPolicies) -> Self {
        self.policies = policies;
        self
    }

    /// With missing-description behaviour
    #[inline]
    #[must_use]
    pub fn with_missing_description(mut self, behaviour: MissingDescription) -> Self {
        self.missing_description = behaviour;
        self
    }

    /// Cap records in flight
    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }
}
