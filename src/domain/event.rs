//! Detected market events.
//!
//! An Event is a sentence-level classification produced by the detector.
//! Events are immutable once created; scoring derives a ScoredEvent from
//! them without mutating the original.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keyword tier an event was classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// No tier keyword matched strongly (kept for completeness)
    Unknown,

    /// Routine market movement vocabulary
    Medium,

    /// Central-bank / macro-release vocabulary
    High,

    /// Crash / crisis / intervention vocabulary
    Critical,
}

impl EventCategory {
    /// Tier base used by the detector to order events and pick out
    /// critical ones. The scorer applies its own category base.
    pub fn base_urgency(&self) -> u8 {
        match self {
            Self::Critical => 9,
            Self::High => 7,
            Self::Medium => 5,
            Self::Unknown => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Unknown => "unknown",
        }
    }
}

/// A single detected event (one sentence of research text)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// The sentence this event was detected in
    pub text: String,

    /// Highest keyword tier that matched
    pub category: EventCategory,

    /// All tier keywords that matched, in tier order
    pub keywords: Vec<String>,

    /// Percentage-change phrases, record highs/lows, emergency wording
    pub market_impact: bool,

    /// "breaking", "just now", "hours ago" style wording
    pub time_sensitive: bool,
}

impl Event {
    /// Urgency implied by the detection alone, before market context is
    /// applied: tier base plus magnitude bonuses for an explicit percentage
    /// in the sentence (≥5% and ≥10% each add one), capped at 10.
    pub fn implied_urgency(&self) -> u8 {
        let mut urgency = self.category.base_urgency();
        if let Some(pct) = percent_magnitude(&self.text) {
            if pct >= 5.0 {
                urgency += 1;
            }
            if pct >= 10.0 {
                urgency += 1;
            }
        }
        urgency.min(10)
    }
}

/// An event plus its context-aware urgency score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEvent {
    pub event: Event,

    /// Final urgency score, always in 1..=10
    pub score: u8,

    /// Whether this event alone clears the override threshold
    pub should_override: bool,
}

/// Largest explicit percentage mentioned in the text, if any
pub fn percent_magnitude(text: &str) -> Option<f64> {
    static PERCENT_RE: OnceLock<Regex> = OnceLock::new();
    let re = PERCENT_RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:%|percent)").expect("valid percent regex")
    });

    re.captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .fold(None, |max, v| match max {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
}
