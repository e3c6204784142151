//! marketcast - breaking-news-aware content production orchestrator
//!
//! On each invocation the pipeline decides whether to produce scheduled
//! educational content or override it with breaking-news content, then
//! drives a fixed sequence of production stages to completion with
//! crash-recoverable state and bounded retries.
//!
//! # Architecture
//!
//! - Free-text market research is classified into scored events
//!   (`signal`), which yield a 1-10 urgency signal.
//! - The decision engine (`decision`) combines that signal with a weekly
//!   topic schedule and manual overrides into a single content directive.
//! - The orchestrator (`core`) sequences the production stages, persisting
//!   run state after every transition; external services sit behind the
//!   collaborator traits in `adapters`.
//!
//! # Usage
//!
//! ```bash
//! # Run the full pipeline
//! marketcast run
//!
//! # Dry-run the decision logic against local research text
//! cat research.txt | marketcast decide --price-change -4.2
//!
//! # Inspect persisted run state
//! marketcast status
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod decision;
pub mod domain;
pub mod signal;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use core::{
    Collaborators, ErrorKind, Orchestrator, RunResult, Stage, StageError, StateManager,
};
pub use decision::{DecisionEngine, ScheduleCatalog, UrgencySignal};
pub use domain::{
    ContentType, Decision, Event, EventCategory, ManualOverride, MarketContext, PipelineRun,
    RecoveryInfo, ResearchBundle, RunStatus, ScoredEvent, StepStatus,
};
pub use signal::{EventDetector, UrgencyReport, UrgencyScorer};
