//! Keyword-tier event detection over free research text.
//!
//! Detection is sentence-level: the text is split into sentences, fragments
//! are discarded, and a sentence becomes an event only if at least one tier
//! keyword matches. Market-impact and time-sensitivity flags are set
//! independently from phrase patterns.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::domain::{Event, EventCategory, ResearchBundle};

/// Crash / crisis / intervention vocabulary
const CRITICAL_KEYWORDS: &[&str] = &[
    "crash",
    "collapse",
    "emergency",
    "crisis",
    "intervention",
    "flash crash",
    "default",
    "contagion",
    "black swan",
    "circuit breaker",
    "halted",
];

/// Central-bank and macro-release vocabulary
const HIGH_KEYWORDS: &[&str] = &[
    "rate cut",
    "rate hike",
    "federal reserve",
    "fed",
    "ecb",
    "boj",
    "inflation",
    "recession",
    "breaking",
    "plunge",
    "surge",
    "nonfarm payrolls",
    "cpi",
    "fomc",
];

/// Routine market-movement vocabulary
const MEDIUM_KEYWORDS: &[&str] = &[
    "volatility",
    "rally",
    "selloff",
    "sell-off",
    "gdp",
    "earnings",
    "forecast",
    "outlook",
    "momentum",
    "retail sales",
    "trade balance",
];

/// Sentence fragments at or below this length are discarded
const MIN_SENTENCE_LEN: usize = 10;

/// Implied urgency at or above this marks an event as critical
const CRITICAL_URGENCY: u8 = 8;

/// Detects market events in free text using keyword tiers and phrase patterns
pub struct EventDetector {
    sentence_re: Regex,
    percent_re: Regex,
    impact_re: Regex,
    time_re: Regex,
}

/// Result of scanning a research bundle for breaking news
#[derive(Debug, Clone, Serialize)]
pub struct BreakingNewsReport {
    pub has_breaking_news: bool,
    pub events: Vec<Event>,

    /// Events with implied urgency >= 8
    pub critical_events: Vec<Event>,

    /// Highest implied urgency seen (0 when no events detected)
    pub max_urgency: u8,
}

impl EventDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Terminators split only when followed by whitespace or end of
            // line, so decimals like "0.5%" survive.
            sentence_re: Regex::new(r"(?m)[.!?]+(?:\s+|$)|\n+")
                .context("invalid sentence pattern")?,
            percent_re: Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:%|percent)")
                .context("invalid percent pattern")?,
            impact_re: Regex::new(
                r"(?i)\b(?:record\s+(?:high|low)|all-time\s+(?:high|low)|unprecedented|emergency|breaking|alert)\b",
            )
            .context("invalid impact pattern")?,
            time_re: Regex::new(
                r"(?i)\b(?:just now|breaking|developing|live|moments ago|\d+\s*(?:minute|hour)s?\s+ago|(?:in the )?last (?:minute|hour)s?)\b",
            )
            .context("invalid time pattern")?,
        })
    }

    /// Classify text into events, sorted by descending implied urgency.
    pub fn detect_events(&self, text: &str) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .split_sentences(text)
            .into_iter()
            .filter_map(|sentence| self.classify_sentence(sentence))
            .collect();

        events.sort_by(|a, b| b.implied_urgency().cmp(&a.implied_urgency()));

        debug!(count = events.len(), "detected events");
        events
    }

    /// Scan a research bundle and summarize whether it contains breaking news.
    pub fn detect_breaking_news(&self, bundle: &ResearchBundle) -> BreakingNewsReport {
        let events = self.detect_events(&bundle.content);
        let critical_events: Vec<Event> = events
            .iter()
            .filter(|e| e.implied_urgency() >= CRITICAL_URGENCY)
            .cloned()
            .collect();
        let max_urgency = events.first().map(|e| e.implied_urgency()).unwrap_or(0);

        BreakingNewsReport {
            has_breaking_news: !critical_events.is_empty(),
            events,
            critical_events,
            max_urgency,
        }
    }

    fn split_sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.sentence_re
            .split(text)
            .map(str::trim)
            .filter(|s| s.len() > MIN_SENTENCE_LEN)
            .collect()
    }

    fn classify_sentence(&self, sentence: &str) -> Option<Event> {
        let lower = sentence.to_lowercase();

        let mut category = EventCategory::Unknown;
        let mut keywords = Vec::new();

        let tiers = [
            (EventCategory::Critical, CRITICAL_KEYWORDS),
            (EventCategory::High, HIGH_KEYWORDS),
            (EventCategory::Medium, MEDIUM_KEYWORDS),
        ];
        for (tier, list) in tiers {
            for keyword in list {
                if lower.contains(keyword) {
                    category = category.max(tier);
                    keywords.push((*keyword).to_string());
                }
            }
        }

        // Not an event unless a tier keyword matched
        if keywords.is_empty() {
            return None;
        }

        let market_impact =
            self.percent_re.is_match(sentence) || self.impact_re.is_match(sentence);
        let time_sensitive = self.time_re.is_match(sentence);

        Some(Event {
            text: sentence.to_string(),
            category,
            keywords,
            market_impact,
            time_sensitive,
        })
    }
}
