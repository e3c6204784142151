//! Single-slot durable pipeline state.
//!
//! The full run document is serialized to the state file after every
//! mutation; there is no batching. Writes go through a temp file in the
//! same directory and are renamed into place, so a crash mid-write leaves
//! either the old document or the new one, never a torn file. Each new run
//! overwrites the slot; history lives inside the one live document.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{PipelineRun, RecoveryInfo, RunStatus, StepStatus};

/// Durable single-document store for the live pipeline run
pub struct StateManager {
    path: PathBuf,
    run: PipelineRun,
}

impl StateManager {
    /// Create a manager over the given state file. Nothing is read or
    /// written until the first mutating call or an explicit load.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            run: PipelineRun::idle(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory run document
    pub fn run(&self) -> &PipelineRun {
        &self.run
    }

    /// Read the persisted document, if one exists. A missing file is not
    /// an error; a corrupt file is.
    pub fn load(&self) -> Result<Option<PipelineRun>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))?;

        let run = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))?;

        Ok(Some(run))
    }

    /// Start a fresh run, overwriting any previously persisted run.
    pub fn init_run(&mut self) -> Result<Uuid> {
        let run_id = Uuid::new_v4();
        self.run = PipelineRun::new(run_id);
        self.persist()?;

        debug!(%run_id, "initialized run state");
        Ok(run_id)
    }

    /// Set the step currently executing
    pub fn set_step(&mut self, step: &str) -> Result<()> {
        self.run.current_step = Some(step.to_string());
        self.persist()
    }

    /// Store a stage output for post-mortem inspection
    pub fn set(&mut self, key: &str, value: serde_json::Value) -> Result<()> {
        self.run.data.insert(key.to_string(), value);
        self.persist()
    }

    /// Append a step record to the run history
    pub fn record_step(
        &mut self,
        step: &str,
        status: StepStatus,
        error: Option<String>,
    ) -> Result<()> {
        self.run.record_step(step, status, error);
        self.persist()
    }

    /// Mark the run finished
    pub fn complete(&mut self, success: bool, error: Option<String>) -> Result<()> {
        self.run.complete(success, error);
        self.persist()
    }

    /// True iff a persisted document exists with status `running` — i.e.
    /// a previous process died mid-run.
    pub fn can_recover(&self) -> bool {
        matches!(
            self.load(),
            Ok(Some(run)) if run.status == RunStatus::Running
        )
    }

    /// Derived view of the persisted run. Idempotent absent further
    /// mutation.
    pub fn get_recovery_info(&self) -> Result<Option<RecoveryInfo>> {
        Ok(self.load()?.map(|run| run.recovery_info()))
    }

    /// Remove the backing file entirely
    pub fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove state file: {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Reset only the in-memory document to idle; storage is untouched.
    /// Deliberately different from [`clear`](Self::clear).
    pub fn reset(&mut self) {
        self.run = PipelineRun::idle();
    }

    /// Serialize the full document and atomically replace the state file.
    fn persist(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.run).context("Failed to serialize run state")?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let mut tmp = match dir {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new_in("."),
        }
        .context("Failed to create temp state file")?;

        tmp.write_all(json.as_bytes())
            .context("Failed to write state")?;
        tmp.flush().context("Failed to flush state")?;

        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;

        Ok(())
    }
}
