//! Retry policy for structured completions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default attempt budget, first attempt included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Linear backoff step after a transport failure
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(5000);

/// Wait schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Retry immediately
    None,
    /// Same wait before every retry
    Fixed { delay_ms: u64 },
    /// Wait `(attempt - 1) * step` before `attempt`
    Linear { step_ms: u64 },
}

impl Backoff {
    /// Linear backoff with the given step
    #[inline]
    #[must_use]
    pub fn linear(step: Duration) -> Self {
        Self::Linear {
            step_ms: u64::try_from(step.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Wait before the 1-indexed `attempt`
    ///
    /// The first attempt never waits.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Linear { step_ms } => {
                Duration::from_millis(step_ms.saturating_mul(u64::from(attempt - 1)))
            }
        }
    }
}

/// How the completion client retries
///
/// Transport failures and malformed replies draw from one shared attempt
/// budget but wait on separate schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait after a transport failure
    pub transport_backoff: Backoff,
    /// Wait after a malformed reply
    pub malformed_backoff: Backoff,
    /// Retry 4xx rejections too (other than 408/429, which always retry)
    pub retry_client_errors: bool,
    /// Tell the model what was wrong with its previous reply
    pub repair_prompt: bool,
}

impl RetryPolicy {
    /// Create default policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With attempt budget
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// With transport backoff
    #[inline]
    #[must_use]
    pub fn with_transport_backoff(mut self, backoff: Backoff) -> Self {
        self.transport_backoff = backoff;
        self
    }

    /// With malformed-reply backoff
    #[inline]
    #[must_use]
    pub fn with_malformed_backoff(mut self, backoff: Backoff) -> Self {
        self.malformed_backoff = backoff;
        self
    }

    /// Fail fast on non-retryable client errors
    #[inline]
    #[must_use]
    pub fn fail_fast_on_client_errors(mut self) -> Self {
        self.retry_client_errors = false;
        self
    }

    /// With repair prompt on malformed replies
    #[inline]
    #[must_use]
    pub fn with_repair_prompt(mut self, enabled: bool) -> Self {
        self.repair_prompt = enabled;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            transport_backoff: Backoff::linear(DEFAULT_BACKOFF_STEP),
            malformed_backoff: Backoff::None,
            retry_client_errors: true,
            repair_prompt: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_backoff_schedule() {
        let backoff = Backoff::linear(DEFAULT_BACKOFF_STEP);
        assert_eq!(backoff.delay_before(1), Duration::ZERO);
        for k in 2..=10u32 {
            assert_eq!(
                backoff.delay_before(k),
                Duration::from_millis(u64::from(k - 1) * 5000)
            );
        }
    }

    #[test]
    fn fixed_and_none() {
        assert_eq!(Backoff::None.delay_before(5), Duration::ZERO);
        let fixed = Backoff::Fixed { delay_ms: 250 };
        assert_eq!(fixed.delay_before(1), Duration::ZERO);
        assert_eq!(fixed.delay_before(7), Duration::from_millis(250));
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.malformed_backoff, Backoff::None);
        assert!(policy.retry_client_errors);
        assert!(!policy.repair_prompt);
    }

    #[test]
    fn policy_from_json() {
        let policy: RetryPolicy = serde_json::from_value(serde_json::json!({
            "max_attempts": 3,
            "transport_backoff": {"kind": "fixed", "delay_ms": 100},
            "malformed_backoff": {"kind": "none"},
            "retry_client_errors": false,
            "repair_prompt": true
        }))
        .unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.transport_backoff, Backoff::Fixed { delay_ms: 100 });
        assert!(policy.repair_prompt);
    }
}
