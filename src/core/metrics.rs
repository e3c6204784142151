//! In-memory run and stage timing metrics.
//!
//! One tracker is owned by each orchestrator instance; nothing here is
//! global. At most one run, and within it one stage, is timed at a time.
//! State is not persisted.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

/// Rolling aggregate for one stage across runs of this tracker
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageAggregate {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub total_duration_ms: u64,
    pub average_duration_ms: u64,
}

/// Timing for one stage attempt within the current run
#[derive(Debug)]
struct ActiveStage {
    name: String,
    started_at: Instant,
}

/// Timing for the current run
#[derive(Debug)]
struct ActiveRun {
    id: Uuid,
    started_at: Instant,
    stage_durations_ms: HashMap<String, u64>,
}

/// Point-in-time view of the tracker, safe to serialize into results
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub runs_total: u64,
    pub runs_succeeded: u64,

    /// Fraction of finished runs that succeeded, 0.0 when none finished
    pub success_rate: f64,

    /// Duration of the most recently finished run
    pub last_run_duration_ms: Option<u64>,

    pub stages: HashMap<String, StageAggregate>,
}

/// Aggregates wall-clock timings per run and per stage
#[derive(Debug, Default)]
pub struct MetricsTracker {
    current_run: Option<ActiveRun>,
    current_stage: Option<ActiveStage>,
    runs_total: u64,
    runs_succeeded: u64,
    last_run_duration_ms: Option<u64>,
    stages: HashMap<String, StageAggregate>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin timing a run. A run already in flight is discarded with a
    /// warning; the tracker assumes one run at a time.
    pub fn start_run(&mut self, id: Uuid) {
        if self.current_run.is_some() {
            warn!("metrics: run started while another was active");
        }
        self.current_run = Some(ActiveRun {
            id,
            started_at: Instant::now(),
            stage_durations_ms: HashMap::new(),
        });
        self.current_stage = None;
    }

    /// Begin timing a stage attempt
    pub fn start_stage(&mut self, name: &str) {
        if self.current_stage.is_some() {
            warn!(stage = name, "metrics: stage started while another was active");
        }
        self.current_stage = Some(ActiveStage {
            name: name.to_string(),
            started_at: Instant::now(),
        });
    }

    /// Finish the active stage attempt and fold it into the aggregates
    pub fn end_stage(&mut self, name: &str, success: bool) {
        let Some(active) = self.current_stage.take() else {
            warn!(stage = name, "metrics: end_stage without start_stage");
            return;
        };
        if active.name != name {
            warn!(
                expected = %active.name,
                got = name,
                "metrics: mismatched stage end"
            );
        }

        let duration_ms = active.started_at.elapsed().as_millis() as u64;

        if let Some(run) = self.current_run.as_mut() {
            *run.stage_durations_ms.entry(active.name.clone()).or_insert(0) += duration_ms;
        }

        let agg = self.stages.entry(active.name).or_default();
        agg.total_runs += 1;
        if success {
            agg.successful_runs += 1;
        } else {
            agg.failed_runs += 1;
        }
        agg.total_duration_ms += duration_ms;
        agg.average_duration_ms = agg.total_duration_ms / agg.total_runs;
    }

    /// Finish the active run
    pub fn end_run(&mut self, success: bool) {
        let Some(run) = self.current_run.take() else {
            warn!("metrics: end_run without start_run");
            return;
        };

        self.runs_total += 1;
        if success {
            self.runs_succeeded += 1;
        }
        self.last_run_duration_ms = Some(run.started_at.elapsed().as_millis() as u64);
        self.current_stage = None;

        tracing::debug!(run_id = %run.id, success, "run metrics finalized");
    }

    /// Current aggregates as a serializable snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_total: self.runs_total,
            runs_succeeded: self.runs_succeeded,
            success_rate: if self.runs_total > 0 {
                self.runs_succeeded as f64 / self.runs_total as f64
            } else {
                0.0
            },
            last_run_duration_ms: self.last_run_duration_ms,
            stages: self.stages.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_aggregates_accumulate() {
        let mut metrics = MetricsTracker::new();
        metrics.start_run(Uuid::new_v4());

        metrics.start_stage("research");
        metrics.end_stage("research", true);
        metrics.start_stage("research");
        metrics.end_stage("research", false);

        let snapshot = metrics.snapshot();
        let agg = &snapshot.stages["research"];
        assert_eq!(agg.total_runs, 2);
        assert_eq!(agg.successful_runs, 1);
        assert_eq!(agg.failed_runs, 1);
    }

    #[test]
    fn test_success_rate_derivation() {
        let mut metrics = MetricsTracker::new();

        metrics.start_run(Uuid::new_v4());
        metrics.end_run(true);
        metrics.start_run(Uuid::new_v4());
        metrics.end_run(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs_total, 2);
        assert_eq!(snapshot.runs_succeeded, 1);
        assert!((snapshot.success_rate - 0.5).abs() < f64::EPSILON);
        assert!(snapshot.last_run_duration_ms.is_some());
    }

    #[test]
    fn test_empty_tracker_snapshot() {
        let snapshot = MetricsTracker::new().snapshot();
        assert_eq!(snapshot.runs_total, 0);
        assert_eq!(snapshot.success_rate, 0.0);
        assert!(snapshot.stages.is_empty());
    }

    #[test]
    fn test_end_stage_without_start_is_ignored() {
        let mut metrics = MetricsTracker::new();
        metrics.end_stage("research", true);
        assert!(metrics.snapshot().stages.is_empty());
    }
}
