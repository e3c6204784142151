//! Content decision logic.
//!
//! Combines the urgency signal, the weekly topic schedule, and manual
//! overrides into a single content directive for the production stages.

pub mod engine;
pub mod schedule;

pub use engine::{DecisionEngine, FactorScores, UrgencySignal};
pub use schedule::{DaySchedule, EducationalTopic, ScheduleCatalog, Slot};
