//! Decision engine integration tests.
//!
//! Exercises the three decision paths (manual override, breaking-news
//! override, scheduled educational) and the metadata derivation rules.

use chrono::{DateTime, TimeZone, Utc};
use marketcast::decision::{DecisionEngine, FactorScores, ScheduleCatalog, UrgencySignal};
use marketcast::domain::{ContentType, EventCategory, ManualOverride, Priority, ThumbnailStyle};

fn engine() -> DecisionEngine {
    DecisionEngine::new().unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn signal(score: f64, urgent: bool) -> UrgencySignal {
    UrgencySignal {
        urgency_score: score,
        is_urgent: urgent,
        factors: FactorScores {
            price_volatility: 2.0,
            economic_events: 1.0,
            breaking_news: score,
            market_sentiment: 0.0,
        },
        top_events: vec!["Markets moved sharply after the announcement".to_string()],
        top_category: Some(EventCategory::High),
        research_text: "EUR/USD slid after the announcement hit the wires".to_string(),
    }
}

#[test]
fn urgency_below_threshold_selects_educational() {
    // urgency 5 against a threshold of 7: the scorer marks the signal
    // non-urgent, and the engine schedules educational content
    let decision = engine()
        .decide_at(
            at(2026, 6, 10, 12),
            &signal(5.0, false),
            &ScheduleCatalog::default(),
            None,
        )
        .unwrap();

    assert_eq!(decision.content_type, ContentType::Educational);
    assert!(!decision.is_urgent);
    assert_eq!(decision.urgency_score, 5.0);
}

#[test]
fn manual_override_wins_regardless_of_inputs() {
    let manual = ManualOverride {
        topic: "Year In Review".to_string(),
        content_type: ContentType::BreakingNews,
        angle: Some("retrospective".to_string()),
    };

    // even a quiet signal cannot dilute a manual override
    let decision = engine()
        .decide_at(
            at(2026, 6, 10, 12),
            &signal(1.0, false),
            &ScheduleCatalog::default(),
            Some(&manual),
        )
        .unwrap();

    assert_eq!(decision.reasoning, "manual_override");
    assert_eq!(decision.urgency_score, 10.0);
    assert_eq!(decision.content_type, ContentType::BreakingNews);
    assert_eq!(decision.topic.title, "Year In Review");
    assert_eq!(decision.topic.angle, "retrospective");
}

#[test]
fn content_type_tracks_urgency_exactly() {
    let e = engine();
    let catalog = ScheduleCatalog::default();

    for (score, urgent) in [(1.0, false), (6.9, false), (7.0, true), (10.0, true)] {
        let decision = e
            .decide_at(at(2026, 6, 10, 12), &signal(score, urgent), &catalog, None)
            .unwrap();

        let expected = if urgent {
            ContentType::BreakingNews
        } else {
            ContentType::Educational
        };
        assert_eq!(decision.content_type, expected, "score {score}");
        assert_eq!(decision.is_urgent, urgent, "score {score}");
    }
}

#[test]
fn breaking_metadata_is_derived_deterministically() {
    let decision = engine()
        .decide_at(
            at(2026, 6, 10, 12),
            &signal(9.0, true),
            &ScheduleCatalog::default(),
            None,
        )
        .unwrap();

    assert_eq!(decision.metadata.duration_secs, 45);
    assert_eq!(decision.metadata.priority, Priority::High);
    assert_eq!(decision.metadata.thumbnail_style, ThumbnailStyle::Urgent);
    assert!(decision.metadata.tags.contains(&"breaking news".to_string()));
    assert!(decision.metadata.hashtags.contains(&"#BreakingNews".to_string()));
}

#[test]
fn educational_metadata_is_derived_deterministically() {
    let decision = engine()
        .decide_at(
            at(2026, 6, 10, 12),
            &signal(3.0, false),
            &ScheduleCatalog::default(),
            None,
        )
        .unwrap();

    assert_eq!(decision.metadata.duration_secs, 60);
    assert_eq!(decision.metadata.priority, Priority::Normal);
    assert_eq!(
        decision.metadata.thumbnail_style,
        ThumbnailStyle::Educational
    );
    assert!(decision
        .metadata
        .tags
        .contains(&"forex education".to_string()));
}

#[test]
fn educational_rotation_cycles_through_the_catalog() {
    let e = engine();
    let catalog = ScheduleCatalog::default();
    let quiet = signal(2.0, false);

    let mut titles = Vec::new();
    for day in 1..=catalog.topics.len() as u32 {
        let decision = e
            .decide_at(at(2026, 1, day, 12), &quiet, &catalog, None)
            .unwrap();
        titles.push(decision.topic.title);
    }

    // one full cycle visits every topic exactly once
    let mut unique = titles.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), catalog.topics.len());
}

#[test]
fn breaking_decision_from_real_research_flow() {
    use marketcast::domain::{MarketContext, ResearchBundle};
    use marketcast::signal::{EventDetector, UrgencyScorer};

    let detector = EventDetector::new().unwrap();
    let scorer = UrgencyScorer::new(7.0);
    let e = engine();

    let bundle = ResearchBundle::new(
        "Breaking: EUR/USD collapsed 8% after an emergency intervention. \
         GBP/USD followed the move lower within minutes.",
    );
    let market = MarketContext {
        price_change_percent: -8.0,
        volume: None,
        hours_since_event: None,
    };

    let report = scorer.score_research(&detector, &bundle, &market);
    let sig = e.summarize(&report, &bundle, &market);
    let decision = e
        .decide_at(at(2026, 6, 10, 12), &sig, &ScheduleCatalog::default(), None)
        .unwrap();

    assert!(sig.is_urgent);
    assert_eq!(decision.content_type, ContentType::BreakingNews);
    // the focus carries the extracted headline, which names the pair
    assert!(decision.topic.focus.contains("EUR/USD"));
}
