//! Research input supplied by the external research collaborator.
//!
//! The core treats `content` as opaque free text; only the detector and
//! scorer look inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated research content handed to the event detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchBundle {
    /// Free-text research content
    pub content: String,

    /// Source citations (URLs or titles)
    #[serde(default)]
    pub citations: Vec<String>,

    /// When the research was gathered
    pub timestamp: DateTime<Utc>,
}

impl ResearchBundle {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            citations: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Market data snapshot used to contextualize event scores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketContext {
    /// Signed price change over the observation window, in percent
    #[serde(default)]
    pub price_change_percent: f64,

    /// Volume snapshot, when the data source provides one
    #[serde(default)]
    pub volume: Option<VolumeSnapshot>,

    /// Hours elapsed since the originating event, when known
    #[serde(default)]
    pub hours_since_event: Option<f64>,
}

/// Current vs. average traded volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSnapshot {
    pub current: f64,
    pub average: f64,
}

impl VolumeSnapshot {
    /// Ratio of current to average volume; None when the average is
    /// zero or negative.
    pub fn ratio(&self) -> Option<f64> {
        if self.average > 0.0 {
            Some(self.current / self.average)
        } else {
            None
        }
    }
}
