//! Weekly schedule and educational topic catalog.
//!
//! The catalog is defined in YAML: an ordered topic rotation plus
//! per-weekday presenter slots. A built-in default covers installations
//! without a schedule file.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// How far a slot hour may be from the current hour and still match
const SLOT_HOUR_TOLERANCE: i64 = 1;

/// The complete schedule: topic rotation plus weekly presenter slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleCatalog {
    /// Ordered rotation of educational topics
    pub topics: Vec<EducationalTopic>,

    /// Presenter slots per weekday
    #[serde(default)]
    pub week: Vec<DaySchedule>,
}

/// One educational topic in the rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationalTopic {
    pub title: String,
    pub angle: String,
    pub focus: String,
}

/// Slots for a single weekday
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Weekday name ("monday" or "mon", case-insensitive)
    pub day: String,

    pub slots: Vec<Slot>,
}

/// A presenter slot at a fixed hour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Hour of day, 0-23
    pub hour: u32,

    /// Presenter persona for this slot
    pub persona: String,

    /// Slot label ("market_open", "week_review", ...)
    pub label: String,
}

impl ScheduleCatalog {
    /// Load a catalog from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schedule file: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse a catalog from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let catalog: Self =
            serde_yaml::from_str(content).context("Failed to parse schedule YAML")?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Validate the catalog definition
    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            anyhow::bail!("Schedule catalog must have at least one topic");
        }

        for day in &self.week {
            if parse_weekday(&day.day).is_none() {
                anyhow::bail!("Unknown weekday in schedule: '{}'", day.day);
            }
            for slot in &day.slots {
                if slot.hour > 23 {
                    anyhow::bail!(
                        "Slot hour {} on {} is out of range (0-23)",
                        slot.hour,
                        day.day
                    );
                }
            }
        }

        Ok(())
    }

    /// Topic for a given day of year: stable rotation independent of
    /// recent history.
    pub fn topic_for_day(&self, day_of_year: u32) -> &EducationalTopic {
        let index = day_of_year as usize % self.topics.len();
        &self.topics[index]
    }

    /// Slot matching the given local time, if any. A slot matches when its
    /// weekday equals the current weekday and its hour is within one hour
    /// of the current hour.
    pub fn slot_for(&self, now: NaiveDateTime) -> Option<&Slot> {
        let weekday = now.weekday();
        let hour = now.hour() as i64;

        self.week
            .iter()
            .filter(|d| parse_weekday(&d.day) == Some(weekday))
            .flat_map(|d| d.slots.iter())
            .find(|slot| (slot.hour as i64 - hour).abs() <= SLOT_HOUR_TOLERANCE)
    }
}

impl Default for ScheduleCatalog {
    fn default() -> Self {
        Self {
            topics: vec![
                topic(
                    "Risk Management Fundamentals",
                    "why most accounts blow up",
                    "position sizing and stop placement",
                ),
                topic(
                    "Reading Candlestick Patterns",
                    "price action without indicators",
                    "engulfing and pin-bar setups",
                ),
                topic(
                    "Support and Resistance That Actually Holds",
                    "levels the market respects",
                    "drawing zones instead of lines",
                ),
                topic(
                    "The Economic Calendar Explained",
                    "trading around scheduled releases",
                    "CPI, NFP and rate decisions",
                ),
                topic(
                    "Leverage and Margin Demystified",
                    "the double-edged sword",
                    "effective leverage and margin calls",
                ),
                topic(
                    "Trading Psychology Basics",
                    "the trader is the weakest link",
                    "revenge trading and overtrading",
                ),
                topic(
                    "Backtesting a Simple Strategy",
                    "evidence before money",
                    "sample size and survivorship bias",
                ),
                topic(
                    "Currency Correlations",
                    "hidden exposure across pairs",
                    "risk stacking in correlated trades",
                ),
                topic(
                    "Building a Trading Plan",
                    "consistency beats brilliance",
                    "entries, exits and review cadence",
                ),
                topic(
                    "Understanding Market Sessions",
                    "when the market actually moves",
                    "London, New York and overlap hours",
                ),
            ],
            week: vec![
                DaySchedule {
                    day: "monday".to_string(),
                    slots: vec![Slot {
                        hour: 9,
                        persona: "Morning Analyst".to_string(),
                        label: "market_open".to_string(),
                    }],
                },
                DaySchedule {
                    day: "wednesday".to_string(),
                    slots: vec![Slot {
                        hour: 14,
                        persona: "Trading Coach".to_string(),
                        label: "midweek_lesson".to_string(),
                    }],
                },
                DaySchedule {
                    day: "friday".to_string(),
                    slots: vec![Slot {
                        hour: 16,
                        persona: "Week Reviewer".to_string(),
                        label: "week_review".to_string(),
                    }],
                },
            ],
        }
    }
}

fn topic(title: &str, angle: &str, focus: &str) -> EducationalTopic {
    EducationalTopic {
        title: title.to_string(),
        angle: angle.to_string(),
        focus: focus.to_string(),
    }
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name.trim().to_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
