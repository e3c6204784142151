//! The decision engine: urgency signal + schedule -> content directive.
//!
//! Manual overrides bypass everything. An urgent signal produces a
//! breaking-news directive angled at the dominant research factor; the
//! extraction there is best-effort and falls back to generic wording
//! rather than failing. A quiet signal produces the scheduled educational
//! topic for the day.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::core::{ErrorKind, Stage, StageError};
use crate::domain::{
    ContentMetadata, ContentType, Decision, EventCategory, ManualOverride, MarketContext,
    Priority, ResearchBundle, ThumbnailStyle, Topic,
};
use crate::signal::UrgencyReport;

use super::schedule::ScheduleCatalog;

/// Per-category research factor scores, 0..=10 each
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FactorScores {
    pub price_volatility: f64,
    pub economic_events: f64,
    pub breaking_news: f64,
    pub market_sentiment: f64,
}

/// The research category that scored highest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Factor {
    Forex,
    Economic,
    Breaking,
    Sentiment,
}

impl Factor {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Forex => "forex",
            Self::Economic => "economic",
            Self::Breaking => "breaking",
            Self::Sentiment => "sentiment",
        }
    }
}

impl FactorScores {
    /// Highest-scoring factor; earlier factors win ties.
    fn dominant(&self) -> Factor {
        let ranked = [
            (Factor::Forex, self.price_volatility),
            (Factor::Economic, self.economic_events),
            (Factor::Breaking, self.breaking_news),
            (Factor::Sentiment, self.market_sentiment),
        ];

        let mut best = ranked[0];
        for candidate in &ranked[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best.0
    }
}

/// Everything the engine needs to know about the urgency of this run
#[derive(Debug, Clone, Serialize)]
pub struct UrgencySignal {
    /// Highest event score, 0..=10
    pub urgency_score: f64,
    pub is_urgent: bool,
    pub factors: FactorScores,

    /// Texts of the highest-scored events, best first
    pub top_events: Vec<String>,

    /// Category of the top event, when any event was detected
    pub top_category: Option<EventCategory>,

    /// Raw research content, used for angle extraction
    pub research_text: String,
}

/// Turns an urgency signal and the weekly schedule into a Decision
pub struct DecisionEngine {
    pair_re: Regex,
    indicator_re: Regex,
    sentiment_re: Regex,
}

impl DecisionEngine {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pair_re: Regex::new(r"\b(?:EUR|USD|GBP|JPY|CHF|AUD|NZD|CAD)/(?:EUR|USD|GBP|JPY|CHF|AUD|NZD|CAD)\b")
                .context("invalid pair pattern")?,
            indicator_re: Regex::new(
                r"(?i)\b(?:cpi|inflation|gdp|interest rates?|rate (?:decision|cut|hike)|employment|payrolls|unemployment|pmi|retail sales)\b",
            )
            .context("invalid indicator pattern")?,
            sentiment_re: Regex::new(
                r"(?i)\b(?:bullish|bearish|fear|greed|panic|optimism|pessimism|risk-off|risk-on|sentiment)\b",
            )
            .context("invalid sentiment pattern")?,
        })
    }

    /// Shape a scoring report into the engine's input signal.
    pub fn summarize(
        &self,
        report: &UrgencyReport,
        bundle: &ResearchBundle,
        context: &MarketContext,
    ) -> UrgencySignal {
        let economic_hits = self.indicator_re.find_iter(&bundle.content).count();
        let sentiment_hits = self.sentiment_re.find_iter(&bundle.content).count();

        UrgencySignal {
            urgency_score: f64::from(report.max_score),
            is_urgent: report.should_override,
            factors: FactorScores {
                price_volatility: context.price_change_percent.abs().min(10.0),
                economic_events: (economic_hits as f64 * 2.0).min(10.0),
                breaking_news: f64::from(report.max_score),
                market_sentiment: (sentiment_hits as f64 * 1.5).min(10.0),
            },
            top_events: report
                .scored_events
                .iter()
                .take(3)
                .map(|s| s.event.text.clone())
                .collect(),
            top_category: report.scored_events.first().map(|s| s.event.category),
            research_text: bundle.content.clone(),
        }
    }

    /// Decide what content to produce right now.
    pub fn decide(
        &self,
        signal: &UrgencySignal,
        catalog: &ScheduleCatalog,
        manual: Option<&ManualOverride>,
    ) -> Result<Decision, StageError> {
        self.decide_at(Utc::now(), signal, catalog, manual)
    }

    /// Deterministic variant of [`decide`](Self::decide) for a fixed clock.
    pub fn decide_at(
        &self,
        now: DateTime<Utc>,
        signal: &UrgencySignal,
        catalog: &ScheduleCatalog,
        manual: Option<&ManualOverride>,
    ) -> Result<Decision, StageError> {
        if let Some(manual) = manual {
            info!(topic = %manual.topic, "manual override in effect");
            return Ok(Decision {
                topic: Topic::new(
                    manual.topic.clone(),
                    manual
                        .angle
                        .clone()
                        .unwrap_or_else(|| "operator directed".to_string()),
                    manual.topic.clone(),
                ),
                content_type: manual.content_type,
                urgency_score: 10.0,
                is_urgent: true,
                reasoning: "manual_override".to_string(),
                metadata: self.metadata_for(manual.content_type, None, signal.top_category),
                timestamp: now,
            });
        }

        if signal.is_urgent {
            return self.decide_breaking(now, signal);
        }

        Ok(self.decide_educational(now, signal, catalog))
    }

    fn decide_breaking(
        &self,
        now: DateTime<Utc>,
        signal: &UrgencySignal,
    ) -> Result<Decision, StageError> {
        // An urgent signal without research content is a wiring bug
        // upstream, not something to paper over.
        if signal.research_text.trim().is_empty() {
            return Err(StageError::new(
                Stage::TopicDecision,
                ErrorKind::InvalidInput,
                "breaking-news decision requires research content",
            ));
        }

        let factor = signal.factors.dominant();
        let topic = self.breaking_topic(factor, signal);

        info!(factor = factor.as_str(), score = signal.urgency_score, "breaking-news override");

        Ok(Decision {
            topic,
            content_type: ContentType::BreakingNews,
            urgency_score: signal.urgency_score,
            is_urgent: true,
            reasoning: format!("urgency_override:{}", factor.as_str()),
            metadata: self.metadata_for(
                ContentType::BreakingNews,
                Some(factor),
                signal.top_category,
            ),
            timestamp: now,
        })
    }

    /// Build the breaking-news topic for the dominant factor. Extraction is
    /// best-effort; every arm falls back to generic wording.
    fn breaking_topic(&self, factor: Factor, signal: &UrgencySignal) -> Topic {
        match factor {
            Factor::Forex => {
                let pairs = self.extract_pairs(&signal.research_text);
                if pairs.is_empty() {
                    generic_breaking_topic()
                } else {
                    let joined = pairs.join(", ");
                    Topic::new(
                        format!("{joined} Under Pressure: What Just Happened"),
                        "rapid price move, explained for traders",
                        joined,
                    )
                }
            }
            Factor::Economic => match self.extract_indicator_sentence(&signal.research_text) {
                Some(sentence) => Topic::new(
                    format!("Economic Shock: {}", truncate(&sentence, 60)),
                    "what this release means for positioning",
                    sentence,
                ),
                None => generic_breaking_topic(),
            },
            Factor::Breaking => match signal.top_events.first() {
                Some(headline) => Topic::new(
                    format!("Breaking: {}", truncate(headline, 70)),
                    "live breakdown of a developing story",
                    headline.clone(),
                ),
                None => generic_breaking_topic(),
            },
            Factor::Sentiment => Topic::new(
                "Market Mood Has Flipped: What Traders Are Missing",
                "sentiment-driven positioning shifts",
                "crowd positioning and sentiment extremes",
            ),
        }
    }

    fn decide_educational(
        &self,
        now: DateTime<Utc>,
        signal: &UrgencySignal,
        catalog: &ScheduleCatalog,
    ) -> Decision {
        let rotation = catalog.topic_for_day(now.ordinal());
        let mut topic = Topic::new(
            rotation.title.clone(),
            rotation.angle.clone(),
            rotation.focus.clone(),
        );

        if let Some(slot) = catalog.slot_for(now.naive_utc()) {
            topic.persona = Some(slot.persona.clone());
            topic.slot = Some(slot.label.clone());
        }

        info!(topic = %topic.title, "scheduled educational content");

        Decision {
            topic,
            content_type: ContentType::Educational,
            urgency_score: signal.urgency_score,
            is_urgent: false,
            reasoning: "scheduled_rotation".to_string(),
            metadata: self.metadata_for(ContentType::Educational, None, signal.top_category),
            timestamp: now,
        }
    }

    fn extract_pairs(&self, text: &str) -> Vec<String> {
        let mut pairs = Vec::new();
        for m in self.pair_re.find_iter(text) {
            let pair = m.as_str().to_string();
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
            if pairs.len() == 3 {
                break;
            }
        }
        pairs
    }

    fn extract_indicator_sentence(&self, text: &str) -> Option<String> {
        text.split(['.', '!', '?', '\n'])
            .map(str::trim)
            .find(|s| s.len() > 10 && self.indicator_re.is_match(s))
            .map(str::to_string)
    }

    fn metadata_for(
        &self,
        content_type: ContentType,
        factor: Option<Factor>,
        category: Option<EventCategory>,
    ) -> ContentMetadata {
        let mut tags = vec![
            "forex".to_string(),
            "trading".to_string(),
            "markets".to_string(),
        ];
        let mut hashtags = vec!["#Forex".to_string(), "#Trading".to_string()];

        match content_type {
            ContentType::BreakingNews => {
                tags.extend([
                    "breaking news".to_string(),
                    "market alert".to_string(),
                    "urgent".to_string(),
                ]);
                hashtags.extend(["#BreakingNews".to_string(), "#MarketAlert".to_string()]);
            }
            ContentType::Educational => {
                tags.extend([
                    "forex education".to_string(),
                    "trading tutorial".to_string(),
                    "learn to trade".to_string(),
                ]);
                hashtags.extend(["#LearnForex".to_string(), "#TradingTips".to_string()]);
            }
        }

        if let Some(factor) = factor {
            let tag = match factor {
                Factor::Forex => "volatility",
                Factor::Economic => "economic news",
                Factor::Breaking => "news",
                Factor::Sentiment => "market sentiment",
            };
            tags.push(tag.to_string());
        }

        if let Some(category) = category {
            let tag = match category {
                EventCategory::Critical => "market crash",
                EventCategory::High => "central banks",
                EventCategory::Medium | EventCategory::Unknown => "market analysis",
            };
            tags.push(tag.to_string());
        }

        ContentMetadata {
            tags,
            hashtags,
            duration_secs: match content_type {
                ContentType::BreakingNews => 45,
                ContentType::Educational => 60,
            },
            priority: match content_type {
                ContentType::BreakingNews => Priority::High,
                ContentType::Educational => Priority::Normal,
            },
            thumbnail_style: match content_type {
                ContentType::BreakingNews => ThumbnailStyle::Urgent,
                ContentType::Educational => ThumbnailStyle::Educational,
            },
        }
    }
}

fn generic_breaking_topic() -> Topic {
    Topic::new(
        "Urgent Market Update",
        "what just moved the markets",
        "major market movement",
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn engine() -> DecisionEngine {
        DecisionEngine::new().unwrap()
    }

    fn quiet_signal() -> UrgencySignal {
        UrgencySignal {
            urgency_score: 5.0,
            is_urgent: false,
            factors: FactorScores {
                price_volatility: 1.0,
                economic_events: 2.0,
                breaking_news: 5.0,
                market_sentiment: 0.0,
            },
            top_events: vec![],
            top_category: None,
            research_text: "calm markets today".to_string(),
        }
    }

    fn urgent_signal(research: &str) -> UrgencySignal {
        UrgencySignal {
            urgency_score: 9.0,
            is_urgent: true,
            factors: FactorScores {
                price_volatility: 8.0,
                economic_events: 4.0,
                breaking_news: 6.0,
                market_sentiment: 2.0,
            },
            top_events: vec!["Markets crashed 10% in the last hour".to_string()],
            top_category: Some(EventCategory::Critical),
            research_text: research.to_string(),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_manual_override_bypasses_everything() {
        let manual = ManualOverride {
            topic: "Special Episode".to_string(),
            content_type: ContentType::Educational,
            angle: None,
        };

        let decision = engine()
            .decide_at(
                at(2026, 3, 2, 12),
                &urgent_signal("EUR/USD collapsed"),
                &ScheduleCatalog::default(),
                Some(&manual),
            )
            .unwrap();

        assert_eq!(decision.reasoning, "manual_override");
        assert_eq!(decision.urgency_score, 10.0);
        assert_eq!(decision.content_type, ContentType::Educational);
        assert_eq!(decision.topic.title, "Special Episode");
    }

    #[test]
    fn test_urgent_signal_selects_breaking_news() {
        let decision = engine()
            .decide_at(
                at(2026, 3, 2, 12),
                &urgent_signal("EUR/USD and GBP/JPY both moved sharply"),
                &ScheduleCatalog::default(),
                None,
            )
            .unwrap();

        assert_eq!(decision.content_type, ContentType::BreakingNews);
        assert!(decision.is_urgent);
        // dominant factor is price volatility, so pairs drive the title
        assert!(decision.topic.title.contains("EUR/USD"));
        assert!(decision.reasoning.starts_with("urgency_override"));
        assert_eq!(decision.metadata.duration_secs, 45);
        assert_eq!(decision.metadata.priority, Priority::High);
        assert_eq!(decision.metadata.thumbnail_style, ThumbnailStyle::Urgent);
    }

    #[test]
    fn test_breaking_extraction_never_fails() {
        // no currency pairs anywhere, extraction falls back
        let decision = engine()
            .decide_at(
                at(2026, 3, 2, 12),
                &urgent_signal("severe dislocation with no symbols mentioned"),
                &ScheduleCatalog::default(),
                None,
            )
            .unwrap();

        assert_eq!(decision.content_type, ContentType::BreakingNews);
        assert_eq!(decision.topic.title, "Urgent Market Update");
    }

    #[test]
    fn test_urgent_with_empty_research_is_an_error() {
        let result = engine().decide_at(
            at(2026, 3, 2, 12),
            &urgent_signal("   "),
            &ScheduleCatalog::default(),
            None,
        );

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(!err.retryable());
    }

    #[test]
    fn test_quiet_signal_selects_educational() {
        let decision = engine()
            .decide_at(
                at(2026, 3, 2, 12),
                &quiet_signal(),
                &ScheduleCatalog::default(),
                None,
            )
            .unwrap();

        assert_eq!(decision.content_type, ContentType::Educational);
        assert!(!decision.is_urgent);
        assert_eq!(decision.reasoning, "scheduled_rotation");
        assert_eq!(decision.metadata.duration_secs, 60);
        assert_eq!(decision.metadata.priority, Priority::Normal);
    }

    #[test]
    fn test_educational_rotation_follows_day_of_year() {
        let catalog = ScheduleCatalog::default();
        let e = engine();

        let d1 = e
            .decide_at(at(2026, 3, 2, 12), &quiet_signal(), &catalog, None)
            .unwrap();
        let d2 = e
            .decide_at(at(2026, 3, 3, 12), &quiet_signal(), &catalog, None)
            .unwrap();
        let again = e
            .decide_at(at(2026, 3, 2, 18), &quiet_signal(), &catalog, None)
            .unwrap();

        assert_ne!(d1.topic.title, d2.topic.title);
        assert_eq!(d1.topic.title, again.topic.title);
    }

    #[test]
    fn test_schedule_slot_attaches_persona() {
        let catalog = ScheduleCatalog::default();

        // 2026-03-02 is a Monday; the default catalog has a 9:00 slot
        let on_slot = engine()
            .decide_at(at(2026, 3, 2, 9), &quiet_signal(), &catalog, None)
            .unwrap();
        assert_eq!(on_slot.topic.persona.as_deref(), Some("Morning Analyst"));
        assert_eq!(on_slot.topic.slot.as_deref(), Some("market_open"));

        // far from any slot, defaults stay unset
        let off_slot = engine()
            .decide_at(at(2026, 3, 2, 22), &quiet_signal(), &catalog, None)
            .unwrap();
        assert!(off_slot.topic.persona.is_none());
        assert!(off_slot.topic.slot.is_none());
    }

    #[test]
    fn test_dominant_factor_tie_prefers_declaration_order() {
        let scores = FactorScores {
            price_volatility: 5.0,
            economic_events: 5.0,
            breaking_news: 5.0,
            market_sentiment: 5.0,
        };
        assert_eq!(scores.dominant(), Factor::Forex);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        let long = "a very long headline that keeps going and going";
        assert!(truncate(long, 12).chars().count() <= 13);
    }
}
