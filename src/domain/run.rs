//! Pipeline run state.
//!
//! Exactly one PipelineRun is live per orchestrator instance. The run is
//! persisted in full after every mutation and overwritten (not appended)
//! by the next run; `history` is the append-only audit trail within a run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No run in progress
    Idle,

    /// Currently executing
    Running,

    /// Completed successfully
    Completed,

    /// Failed with error
    Failed,
}

/// Status of a single step attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Started,
    Completed,
    Failed,
}

/// One entry in a run's history. Retries append additional records for
/// the same step rather than overwriting earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub timestamp: DateTime<Utc>,
    pub status: StepStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A single pipeline execution, as persisted to the state file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub start_time: DateTime<Utc>,

    /// Step currently executing (or last set)
    #[serde(default)]
    pub current_step: Option<String>,

    pub status: RunStatus,

    /// Stage outputs keyed by stage name, for post-mortem inspection
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,

    /// Append-only record of every step attempt
    #[serde(default)]
    pub history: Vec<StepRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineRun {
    /// Create a fresh running pipeline state
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            start_time: Utc::now(),
            current_step: None,
            status: RunStatus::Running,
            data: HashMap::new(),
            history: Vec::new(),
            end_time: None,
            duration_ms: None,
            error: None,
        }
    }

    /// An idle placeholder document (used before the first run and by reset)
    pub fn idle() -> Self {
        let mut run = Self::new(Uuid::new_v4());
        run.status = RunStatus::Idle;
        run
    }

    /// Append a step record to the history
    pub fn record_step(&mut self, step: &str, status: StepStatus, error: Option<String>) {
        self.history.push(StepRecord {
            step: step.to_string(),
            timestamp: Utc::now(),
            status,
            error,
        });
    }

    /// Mark the run finished and stamp end time and duration
    pub fn complete(&mut self, success: bool, error: Option<String>) {
        let now = Utc::now();
        self.status = if success {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        self.end_time = Some(now);
        self.duration_ms = Some(
            now.signed_duration_since(self.start_time)
                .num_milliseconds()
                .max(0) as u64,
        );
        self.error = error;
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Steps with at least one completed record, in first-completion order
    pub fn completed_steps(&self) -> Vec<String> {
        self.steps_with_status(StepStatus::Completed)
    }

    /// Steps with at least one failed record, in first-failure order
    pub fn failed_steps(&self) -> Vec<String> {
        self.steps_with_status(StepStatus::Failed)
    }

    fn steps_with_status(&self, status: StepStatus) -> Vec<String> {
        let mut steps = Vec::new();
        for record in &self.history {
            if record.status == status && !steps.contains(&record.step) {
                steps.push(record.step.clone());
            }
        }
        steps
    }

    /// Derived recovery view of this run
    pub fn recovery_info(&self) -> RecoveryInfo {
        RecoveryInfo {
            run_id: self.run_id,
            status: self.status,
            current_step: self.current_step.clone(),
            start_time: self.start_time,
            completed_steps: self.completed_steps(),
            failed_steps: self.failed_steps(),
        }
    }
}

/// Summary of a persisted run used to assess resumability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryInfo {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub current_step: Option<String>,
    pub start_time: DateTime<Utc>,
    pub completed_steps: Vec<String>,
    pub failed_steps: Vec<String>,
}
