//! Retry policy and per-run error accounting.
//!
//! The backoff law is exponential with a cap. The handler's counters are
//! scoped to one orchestrator run; they are keyed by (stage, kind) so a
//! stage that alternates failure kinds is still bounded per kind.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use super::errors::{ErrorKind, Stage, StageError};

/// Retry policy for failed stages
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = max_retries + 1
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,

    /// Ceiling for the computed delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 5000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given failure count (1-indexed):
    /// base × 2^(count−1), capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay_ms.saturating_mul(1u64 << exp);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Whether another attempt is allowed after `failures` failures
    pub fn should_retry(&self, failures: u32) -> bool {
        failures <= self.max_retries
    }
}

/// Verdict for a single stage failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryVerdict {
    /// Try again after the given delay
    Retry { attempt: u32, delay: Duration },

    /// Give up; the error terminates the stage
    Fatal,
}

/// Classifies stage failures and tracks failure counts for one run
#[derive(Debug)]
pub struct ErrorHandler {
    policy: RetryPolicy,
    counts: HashMap<(Stage, ErrorKind), u32>,
}

impl ErrorHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            counts: HashMap::new(),
        }
    }

    /// Record a failure and decide whether the stage should retry.
    pub fn verdict(&mut self, error: &StageError) -> RetryVerdict {
        let count = self
            .counts
            .entry((error.stage, error.kind))
            .and_modify(|c| *c += 1)
            .or_insert(1);

        if error.retryable() && self.policy.should_retry(*count) {
            let delay = self.policy.delay_for_attempt(*count);
            debug!(
                stage = %error.stage,
                kind = %error.kind,
                failures = *count,
                delay_ms = delay.as_millis() as u64,
                "retrying stage"
            );
            RetryVerdict::Retry {
                attempt: *count,
                delay,
            }
        } else {
            RetryVerdict::Fatal
        }
    }

    /// Failure count recorded for a (stage, kind) pair
    pub fn failures(&self, stage: Stage, kind: ErrorKind) -> u32 {
        self.counts.get(&(stage, kind)).copied().unwrap_or(0)
    }

    /// Drop all counters. The handler is already run-scoped; this exists
    /// for embedders that keep one handler across runs.
    pub fn reset(&mut self) {
        self.counts.clear();
    }
}
