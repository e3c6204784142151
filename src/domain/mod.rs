//! Domain types for the marketcast orchestrator.
//!
//! This module contains the core data structures:
//! - Event: sentence-level classification of market-moving text
//! - Decision: the content directive handed to production stages
//! - PipelineRun: persisted pipeline execution state

pub mod decision;
pub mod event;
pub mod research;
pub mod run;

// Re-export commonly used types
pub use decision::{
    ContentMetadata, ContentType, Decision, ManualOverride, Priority, ThumbnailStyle, Topic,
};
pub use event::{Event, EventCategory, ScoredEvent};
pub use research::{MarketContext, ResearchBundle, VolumeSnapshot};
pub use run::{PipelineRun, RecoveryInfo, RunStatus, StepRecord, StepStatus};
