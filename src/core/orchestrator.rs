//! Main orchestrator for content production runs.
//!
//! Drives the fixed stage sequence (research through upload), persisting
//! run state after every transition and guarding each stage with the
//! retry policy. A failing stage aborts everything after it; `run()`
//! converts terminal failures into a structured result instead of
//! propagating them.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{
    ResearchProvider, ScriptGenerator, UploadReceipt, Uploader, VideoProducer,
};
use crate::config::Config;
use crate::decision::{DecisionEngine, ScheduleCatalog};
use crate::domain::{Decision, ManualOverride, RecoveryInfo, RunStatus, StepStatus};
use crate::signal::{EventDetector, UrgencyScorer};

use super::errors::{Stage, StageError};
use super::metrics::{MetricsSnapshot, MetricsTracker};
use super::retry::{ErrorHandler, RetryPolicy, RetryVerdict};
use super::state::StateManager;

/// The external collaborators the pipeline drives
#[derive(Clone)]
pub struct Collaborators {
    pub research: Arc<dyn ResearchProvider>,
    pub scripts: Arc<dyn ScriptGenerator>,
    pub video: Arc<dyn VideoProducer>,
    pub uploader: Arc<dyn Uploader>,
}

/// Outcome of a pipeline run. `run()` always returns one of these; it
/// never propagates stage errors to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,

    /// Stage the run failed in, when it failed inside a stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadReceipt>,

    pub metrics: MetricsSnapshot,
}

impl RunResult {
    fn failure(
        run_id: Option<Uuid>,
        stage: Option<Stage>,
        error: String,
        metrics: MetricsSnapshot,
    ) -> Self {
        Self {
            success: false,
            run_id,
            stage: stage.map(|s| s.as_str().to_string()),
            error: Some(error),
            decision: None,
            upload: None,
            metrics,
        }
    }
}

/// Sequences the production stages with persisted state and retries
pub struct Orchestrator {
    detector: Arc<EventDetector>,
    scorer: Arc<UrgencyScorer>,
    engine: Arc<DecisionEngine>,
    catalog: Arc<ScheduleCatalog>,
    collaborators: Collaborators,
    policy: RetryPolicy,
    state: StateManager,
    metrics: MetricsTracker,
}

impl Orchestrator {
    /// Build an orchestrator from config, a schedule catalog, and the
    /// collaborator set.
    pub fn new(
        config: &Config,
        catalog: ScheduleCatalog,
        collaborators: Collaborators,
    ) -> Result<Self> {
        Ok(Self {
            detector: Arc::new(EventDetector::new()?),
            scorer: Arc::new(UrgencyScorer::new(config.urgency_threshold)),
            engine: Arc::new(DecisionEngine::new()?),
            catalog: Arc::new(catalog),
            collaborators,
            policy: RetryPolicy {
                max_retries: config.max_retries,
                base_delay_ms: config.retry_delay_ms,
                max_delay_ms: config.max_retry_delay_ms,
            },
            state: StateManager::new(&config.state_file_path),
            metrics: MetricsTracker::new(),
        })
    }

    /// The persisted-state manager (read access for status inspection)
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Current metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// True iff a previous process died mid-run
    pub fn can_recover(&self) -> bool {
        self.state.can_recover()
    }

    /// Recovery view of the persisted run, if any
    pub fn get_recovery_info(&self) -> Result<Option<RecoveryInfo>> {
        self.state.get_recovery_info()
    }

    /// Execute one full pipeline run.
    #[instrument(skip(self, manual))]
    pub async fn run(&mut self, manual: Option<ManualOverride>) -> RunResult {
        let run_id = match self.state.init_run() {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "failed to initialize run state");
                return RunResult::failure(
                    None,
                    None,
                    format!("failed to initialize run state: {e}"),
                    self.metrics.snapshot(),
                );
            }
        };

        info!(%run_id, "starting pipeline run");
        self.metrics.start_run(run_id);

        match self.drive(manual).await {
            Ok((decision, receipt)) => {
                if let Err(e) = self.state.complete(true, None) {
                    warn!(error = %e, "failed to persist run completion");
                }
                self.metrics.end_run(true);
                info!(%run_id, video_id = %receipt.video_id, "pipeline run completed");

                RunResult {
                    success: true,
                    run_id: Some(run_id),
                    stage: None,
                    error: None,
                    decision: Some(decision),
                    upload: Some(receipt),
                    metrics: self.metrics.snapshot(),
                }
            }
            Err(err) => {
                if let Err(e) = self.state.complete(false, Some(err.to_string())) {
                    warn!(error = %e, "failed to persist run failure");
                }
                self.metrics.end_run(false);
                error!(%run_id, stage = %err.stage, error = %err, "pipeline run failed");

                RunResult::failure(
                    Some(run_id),
                    Some(err.stage),
                    err.to_string(),
                    self.metrics.snapshot(),
                )
            }
        }
    }

    /// Attempt recovery after a crash.
    ///
    /// Mid-pipeline resume is not supported: completed stage outputs are
    /// not rehydrated, so a recoverable run is restarted from the top.
    /// Without a persisted run in `running` status this fails instead.
    #[instrument(skip(self))]
    pub async fn resume(&mut self) -> RunResult {
        let info = match self.state.get_recovery_info() {
            Ok(Some(info)) if info.status == RunStatus::Running => info,
            Ok(_) => {
                return RunResult::failure(
                    None,
                    None,
                    "no recoverable state".to_string(),
                    self.metrics.snapshot(),
                );
            }
            Err(e) => {
                return RunResult::failure(
                    None,
                    None,
                    format!("failed to read recovery state: {e}"),
                    self.metrics.snapshot(),
                );
            }
        };

        info!(
            run_id = %info.run_id,
            current_step = info.current_step.as_deref().unwrap_or("-"),
            completed = info.completed_steps.len(),
            "found interrupted run"
        );
        warn!("mid-pipeline resume is not supported; starting a fresh run");

        self.run(None).await
    }

    /// Run every stage in order, threading outputs forward. The first
    /// terminal stage error aborts all subsequent stages.
    async fn drive(
        &mut self,
        manual: Option<ManualOverride>,
    ) -> Result<(Decision, UploadReceipt), StageError> {
        let mut handler = ErrorHandler::new(self.policy.clone());

        let payload = {
            let research = self.collaborators.research.clone();
            self.execute(&mut handler, Stage::Research, move || {
                let research = research.clone();
                async move { research.fetch().await }
            })
            .await?
        };
        self.set_data(
            Stage::Research,
            serde_json::json!({
                "citations": payload.bundle.citations,
                "content_chars": payload.bundle.content.len(),
                "timestamp": payload.bundle.timestamp,
            }),
        )?;

        let report = {
            let detector = self.detector.clone();
            let scorer = self.scorer.clone();
            let bundle = payload.bundle.clone();
            let market = payload.market.clone();
            self.execute(&mut handler, Stage::EventDetection, move || {
                let detector = detector.clone();
                let scorer = scorer.clone();
                let bundle = bundle.clone();
                let market = market.clone();
                async move {
                    Ok::<_, StageError>(scorer.score_research(&detector, &bundle, &market))
                }
            })
            .await?
        };
        self.set_data(
            Stage::EventDetection,
            serde_json::json!({
                "max_score": report.max_score,
                "should_override": report.should_override,
                "critical_count": report.critical_count,
                "high_count": report.high_count,
            }),
        )?;

        let signal = self
            .engine
            .summarize(&report, &payload.bundle, &payload.market);
        let decision = {
            let engine = self.engine.clone();
            let catalog = self.catalog.clone();
            let signal = signal.clone();
            let manual = manual.clone();
            self.execute(&mut handler, Stage::TopicDecision, move || {
                let engine = engine.clone();
                let catalog = catalog.clone();
                let signal = signal.clone();
                let manual = manual.clone();
                async move { engine.decide(&signal, &catalog, manual.as_ref()) }
            })
            .await?
        };
        self.set_data(
            Stage::TopicDecision,
            serde_json::to_value(&decision)
                .map_err(|e| StageError::io(Stage::TopicDecision, e.to_string()))?,
        )?;

        let script = {
            let scripts = self.collaborators.scripts.clone();
            let decision = decision.clone();
            self.execute(&mut handler, Stage::ScriptGeneration, move || {
                let scripts = scripts.clone();
                let decision = decision.clone();
                async move { scripts.generate(&decision).await }
            })
            .await?
        };
        self.set_data(
            Stage::ScriptGeneration,
            serde_json::json!({ "title": script.title, "body_chars": script.body.len() }),
        )?;

        let script = {
            let scripts = self.collaborators.scripts.clone();
            let draft = script.clone();
            self.execute(&mut handler, Stage::ScriptReview, move || {
                let scripts = scripts.clone();
                let draft = draft.clone();
                async move { scripts.review(draft).await }
            })
            .await?
        };
        self.set_data(
            Stage::ScriptReview,
            serde_json::json!({ "reviewed": script.reviewed, "body_chars": script.body.len() }),
        )?;

        let video = {
            let producer = self.collaborators.video.clone();
            let script = script.clone();
            self.execute(&mut handler, Stage::VideoProduction, move || {
                let producer = producer.clone();
                let script = script.clone();
                async move { producer.render(&script).await }
            })
            .await?
        };
        self.set_data(
            Stage::VideoProduction,
            serde_json::json!({ "path": video.path }),
        )?;

        let video = {
            let producer = self.collaborators.video.clone();
            let video = video.clone();
            let decision = decision.clone();
            self.execute(&mut handler, Stage::BrandOverlay, move || {
                let producer = producer.clone();
                let video = video.clone();
                let decision = decision.clone();
                async move { producer.apply_branding(video, &decision).await }
            })
            .await?
        };
        self.set_data(
            Stage::BrandOverlay,
            serde_json::json!({ "path": video.path, "branded": video.branded }),
        )?;

        let receipt = {
            let uploader = self.collaborators.uploader.clone();
            let video = video.clone();
            let decision = decision.clone();
            self.execute(&mut handler, Stage::Upload, move || {
                let uploader = uploader.clone();
                let video = video.clone();
                let decision = decision.clone();
                async move { uploader.upload(&video, &decision).await }
            })
            .await?
        };
        self.set_data(
            Stage::Upload,
            serde_json::to_value(&receipt)
                .map_err(|e| StageError::io(Stage::Upload, e.to_string()))?,
        )?;

        Ok((decision, receipt))
    }

    /// Run one stage with retry. Every attempt appends a `started` record;
    /// a terminal failure appends a `failed` record and re-raises.
    async fn execute<T, F, Fut>(
        &mut self,
        handler: &mut ErrorHandler,
        stage: Stage,
        mut f: F,
    ) -> Result<T, StageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StageError>>,
    {
        self.state
            .set_step(stage.as_str())
            .map_err(|e| StageError::io(stage, e.to_string()))?;

        loop {
            self.state
                .record_step(stage.as_str(), StepStatus::Started, None)
                .map_err(|e| StageError::io(stage, e.to_string()))?;
            self.metrics.start_stage(stage.as_str());
            debug!(%stage, "stage started");

            match f().await {
                Ok(value) => {
                    self.metrics.end_stage(stage.as_str(), true);
                    self.state
                        .record_step(stage.as_str(), StepStatus::Completed, None)
                        .map_err(|e| StageError::io(stage, e.to_string()))?;
                    debug!(%stage, "stage completed");
                    return Ok(value);
                }
                Err(err) => {
                    self.metrics.end_stage(stage.as_str(), false);

                    match handler.verdict(&err) {
                        RetryVerdict::Retry { attempt, delay } => {
                            warn!(
                                %stage,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %err,
                                "stage failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryVerdict::Fatal => {
                            self.state
                                .record_step(
                                    stage.as_str(),
                                    StepStatus::Failed,
                                    Some(err.message.clone()),
                                )
                                .map_err(|e| StageError::io(stage, e.to_string()))?;
                            error!(%stage, error = %err, "stage failed permanently");
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    fn set_data(&mut self, stage: Stage, value: serde_json::Value) -> Result<(), StageError> {
        self.state
            .set(stage.as_str(), value)
            .map_err(|e| StageError::io(stage, e.to_string()))
    }
}
