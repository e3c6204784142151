//! Context-aware urgency scoring.
//!
//! Scores are built up additively from the event itself, then modified by
//! market context, decayed by event age, and finally rounded and clamped
//! into 1..=10.

use serde::Serialize;

use crate::domain::{Event, EventCategory, MarketContext, ResearchBundle, ScoredEvent};

use super::detector::EventDetector;

/// Scores events against market context and decides override eligibility
#[derive(Debug, Clone)]
pub struct UrgencyScorer {
    /// Scores at or above this trigger the breaking-news override
    threshold: f64,
}

/// Composed detection + scoring result for a research bundle
#[derive(Debug, Clone, Serialize)]
pub struct UrgencyReport {
    pub events: Vec<Event>,
    pub scored_events: Vec<ScoredEvent>,

    /// Highest score across events (0 when no events detected)
    pub max_score: u8,
    pub should_override: bool,
    pub critical_count: usize,
    pub high_count: usize,
}

impl UrgencyScorer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score a single event in context. Always returns a value in 1..=10.
    pub fn calculate_score(&self, event: &Event, context: &MarketContext) -> u8 {
        let mut score = match event.category {
            EventCategory::Critical => 8.0,
            EventCategory::High => 6.0,
            EventCategory::Medium => 4.0,
            EventCategory::Unknown => 2.0,
        };

        if event.market_impact {
            score += 2.0;
        }
        if event.time_sensitive {
            score += 1.0;
        }

        // Diminishing keyword-count bonus
        score += event.keywords.len().min(3) as f64 * 0.5;

        score += price_change_modifier(context.price_change_percent.abs());

        if let Some(ratio) = context.volume.as_ref().and_then(|v| v.ratio()) {
            score += volume_modifier(ratio);
        }

        if let Some(hours) = context.hours_since_event {
            if hours > 0.0 {
                score *= decay_factor(hours);
            }
        }

        (score.round() as i64).clamp(1, 10) as u8
    }

    /// Whether a score clears the configured override threshold
    pub fn should_override(&self, score: u8) -> bool {
        f64::from(score) >= self.threshold
    }

    /// Score a batch of events, sorted non-increasing by score.
    pub fn score_events(&self, events: Vec<Event>, context: &MarketContext) -> Vec<ScoredEvent> {
        let mut scored: Vec<ScoredEvent> = events
            .into_iter()
            .map(|event| {
                let score = self.calculate_score(&event, context);
                ScoredEvent {
                    event,
                    score,
                    should_override: self.should_override(score),
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    /// Detect and score a research bundle in one call.
    pub fn score_research(
        &self,
        detector: &EventDetector,
        bundle: &ResearchBundle,
        context: &MarketContext,
    ) -> UrgencyReport {
        let events = detector.detect_events(&bundle.content);
        let scored_events = self.score_events(events.clone(), context);

        let max_score = scored_events.first().map(|s| s.score).unwrap_or(0);
        let critical_count = events
            .iter()
            .filter(|e| e.category == EventCategory::Critical)
            .count();
        let high_count = events
            .iter()
            .filter(|e| e.category == EventCategory::High)
            .count();

        UrgencyReport {
            events,
            scored_events,
            max_score,
            should_override: f64::from(max_score) >= self.threshold,
            critical_count,
            high_count,
        }
    }
}

fn price_change_modifier(abs_change: f64) -> f64 {
    if abs_change >= 10.0 {
        3.0
    } else if abs_change >= 5.0 {
        2.0
    } else if abs_change >= 3.0 {
        1.0
    } else if abs_change >= 1.0 {
        0.5
    } else {
        0.0
    }
}

fn volume_modifier(ratio: f64) -> f64 {
    if ratio >= 3.0 {
        2.0
    } else if ratio >= 2.0 {
        1.5
    } else if ratio >= 1.5 {
        1.0
    } else {
        0.0
    }
}

/// Step decay by event age; the nearest lower threshold wins, so the
/// 4-6h band inherits the 3-4h factor.
fn decay_factor(hours: f64) -> f64 {
    if hours < 1.0 {
        1.0
    } else if hours < 2.0 {
        0.9
    } else if hours < 3.0 {
        0.8
    } else if hours < 6.0 {
        0.7
    } else if hours < 12.0 {
        0.5
    } else if hours < 24.0 {
        0.3
    } else {
        0.1
    }
}
