//! The content directive produced by the decision engine.
//!
//! A Decision is created once per run and consumed by the production
//! stages; it is never mutated after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of content this run will produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Urgent content overriding the weekly schedule
    BreakingNews,

    /// Scheduled educational content
    Educational,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BreakingNews => "breaking_news",
            Self::Educational => "educational",
        }
    }
}

/// Production priority attached to the directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

/// Thumbnail treatment requested from the render collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailStyle {
    Educational,
    Urgent,
}

/// The topic the script collaborator will write about.
///
/// `persona` and `slot` stay None when no weekly-schedule slot matches
/// the current hour; downstream stages treat None as "default presenter,
/// unscheduled".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub angle: String,
    pub focus: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
}

impl Topic {
    pub fn new(
        title: impl Into<String>,
        angle: impl Into<String>,
        focus: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            angle: angle.into(),
            focus: focus.into(),
            persona: None,
            slot: None,
        }
    }
}

/// Deterministically derived production metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub tags: Vec<String>,
    pub hashtags: Vec<String>,

    /// Target video length in seconds
    pub duration_secs: u32,

    pub priority: Priority,
    pub thumbnail_style: ThumbnailStyle,
}

/// The directive handed to the production stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub topic: Topic,
    pub content_type: ContentType,

    /// Urgency that drove this decision, 0..=10
    pub urgency_score: f64,
    pub is_urgent: bool,

    /// Short machine-readable rationale ("manual_override",
    /// "urgency_override", "scheduled_rotation")
    pub reasoning: String,

    pub metadata: ContentMetadata,
    pub timestamp: DateTime<Utc>,
}

/// Operator-supplied override that bypasses urgency and schedule logic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualOverride {
    pub topic: String,
    pub content_type: ContentType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
}
