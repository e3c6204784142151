//! Detection and scoring integration tests.
//!
//! Covers the end-to-end path from raw research text to override signal,
//! plus the score-range and ordering properties the decision logic
//! depends on.

use marketcast::domain::{Event, EventCategory, MarketContext, ResearchBundle, VolumeSnapshot};
use marketcast::signal::{EventDetector, UrgencyScorer};

const BREAKING_TEXT: &str = "Breaking: Federal Reserve announces emergency rate cut of 0.5%. \
     Markets crashed 10% in the last hour.";

fn detector() -> EventDetector {
    EventDetector::new().unwrap()
}

#[test]
fn breaking_fed_text_yields_critical_event() {
    let events = detector().detect_events(BREAKING_TEXT);

    assert!(!events.is_empty());
    assert!(events
        .iter()
        .any(|e| e.category == EventCategory::Critical));
}

#[test]
fn breaking_fed_text_scores_at_the_top_and_overrides() {
    let scorer = UrgencyScorer::new(7.0);
    let events = detector().detect_events(BREAKING_TEXT);

    let context = MarketContext {
        price_change_percent: -10.0,
        volume: None,
        hours_since_event: None,
    };

    let scored = scorer.score_events(events, &context);
    let top = &scored[0];

    assert!((9..=10).contains(&top.score), "top score was {}", top.score);
    assert!(top.should_override);
}

#[test]
fn score_is_always_within_bounds() {
    let scorer = UrgencyScorer::new(7.0);

    let categories = [
        EventCategory::Critical,
        EventCategory::High,
        EventCategory::Medium,
        EventCategory::Unknown,
    ];
    let flags = [(false, false), (true, false), (false, true), (true, true)];
    let price_changes = [0.0, -0.5, 2.0, -4.0, 7.5, -15.0];
    let volumes = [None, Some((120.0, 100.0)), Some((500.0, 100.0))];
    let hours = [None, Some(0.5), Some(3.0), Some(13.0), Some(72.0)];

    for category in categories {
        for (market_impact, time_sensitive) in flags {
            for price in price_changes {
                for volume in volumes {
                    for hours_since_event in hours {
                        let event = Event {
                            text: "grid case".to_string(),
                            category,
                            keywords: vec!["kw".to_string(); 4],
                            market_impact,
                            time_sensitive,
                        };
                        let context = MarketContext {
                            price_change_percent: price,
                            volume: volume.map(|(current, average)| VolumeSnapshot {
                                current,
                                average,
                            }),
                            hours_since_event,
                        };

                        let score = scorer.calculate_score(&event, &context);
                        assert!(
                            (1..=10).contains(&score),
                            "score {score} out of bounds for {category:?}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn scored_events_are_sorted_non_increasing() {
    let scorer = UrgencyScorer::new(7.0);
    let text = "Retail sales momentum improved modestly in the quarter. \
                Flash crash erased 11% from the index just now. \
                The ecb hinted at a rate cut amid recession fears.";

    let scored = scorer.score_events(detector().detect_events(text), &MarketContext::default());

    assert_eq!(scored.len(), 3);
    for pair in scored.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn override_tracks_the_configured_threshold_exactly() {
    for threshold in 1..=10u8 {
        let scorer = UrgencyScorer::new(f64::from(threshold));
        for score in 1..=10u8 {
            assert_eq!(
                scorer.should_override(score),
                score >= threshold,
                "threshold {threshold}, score {score}"
            );
        }
    }
}

#[test]
fn stale_events_decay_below_the_threshold() {
    let scorer = UrgencyScorer::new(7.0);
    let bundle = ResearchBundle::new(BREAKING_TEXT);

    let fresh = scorer.score_research(
        &detector(),
        &bundle,
        &MarketContext {
            price_change_percent: -10.0,
            volume: None,
            hours_since_event: None,
        },
    );
    let stale = scorer.score_research(
        &detector(),
        &bundle,
        &MarketContext {
            price_change_percent: -10.0,
            volume: None,
            hours_since_event: Some(48.0),
        },
    );

    assert!(fresh.should_override);
    assert!(!stale.should_override);
    assert!(stale.max_score < fresh.max_score);
}

#[test]
fn report_counts_follow_detected_categories() {
    let scorer = UrgencyScorer::new(7.0);
    let bundle = ResearchBundle::new(
        "Currency collapse triggered a crisis response overnight. \
         Inflation data from the fed surprised to the upside. \
         Earnings outlook for the quarter stays unchanged.",
    );

    let report = scorer.score_research(&detector(), &bundle, &MarketContext::default());

    assert_eq!(report.critical_count, 1);
    assert_eq!(report.high_count, 1);
    assert_eq!(report.events.len(), report.scored_events.len());
}
