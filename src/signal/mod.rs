//! Event detection and urgency scoring.
//!
//! The detector classifies free research text into events; the scorer
//! converts events plus market context into the 1-10 urgency signal that
//! drives the breaking-news override.

pub mod detector;
pub mod scorer;

pub use detector::{BreakingNewsReport, EventDetector};
pub use scorer::{UrgencyReport, UrgencyScorer};
