//! Typed pipeline errors.
//!
//! Retryability is declared at the point of origin via [`ErrorKind`], never
//! inferred from error message text. Collaborators tag every failure with
//! the stage it occurred in and the kind of failure.

use serde::Serialize;
use thiserror::Error;

/// The fixed production stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Research,
    EventDetection,
    TopicDecision,
    ScriptGeneration,
    ScriptReview,
    VideoProduction,
    BrandOverlay,
    Upload,
}

impl Stage {
    /// Execution order of the pipeline; there is no branching or skipping.
    pub const ALL: [Stage; 8] = [
        Stage::Research,
        Stage::EventDetection,
        Stage::TopicDecision,
        Stage::ScriptGeneration,
        Stage::ScriptReview,
        Stage::VideoProduction,
        Stage::BrandOverlay,
        Stage::Upload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::EventDetection => "event_detection",
            Self::TopicDecision => "topic_decision",
            Self::ScriptGeneration => "script_generation",
            Self::ScriptReview => "script_review",
            Self::VideoProduction => "video_production",
            Self::BrandOverlay => "brand_overlay",
            Self::Upload => "upload",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong, independent of which stage it happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection failures, resets, DNS
    Network,

    /// A collaborator exceeded its deadline
    Timeout,

    /// Explicit rate limiting (HTTP 429 and friends)
    RateLimited,

    /// The collaborator itself failed (5xx, non-zero exit)
    Upstream,

    /// Local I/O failure (state file, subprocess spawn)
    Io,

    /// A required input was missing or malformed
    InvalidInput,

    /// A collaborator returned output the pipeline cannot use
    InvalidOutput,

    /// Misconfiguration detected at runtime
    Config,
}

impl ErrorKind {
    /// Transient failures are worth retrying; everything else fails the
    /// stage immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Upstream
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Upstream => "upstream",
            Self::Io => "io",
            Self::InvalidInput => "invalid_input",
            Self::InvalidOutput => "invalid_output",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage failure with its origin and retryability
#[derive(Debug, Clone, Error)]
#[error("{stage} failed ({kind}): {message}")]
pub struct StageError {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    pub fn network(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, ErrorKind::Network, message)
    }

    pub fn timeout(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, ErrorKind::Timeout, message)
    }

    pub fn upstream(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, ErrorKind::Upstream, message)
    }

    pub fn io(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, ErrorKind::Io, message)
    }

    pub fn invalid_output(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, ErrorKind::InvalidOutput, message)
    }

    pub fn retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
