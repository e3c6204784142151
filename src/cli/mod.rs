//! Command-line interface for marketcast.
//!
//! Provides commands for running the production pipeline, resuming after
//! a crash, inspecting persisted run state, and dry-running the decision
//! logic against local research text.

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters::{
    CommandScriptGenerator, CommandUploader, CommandVideoProducer, HttpResearchProvider,
};
use crate::config::Config;
use crate::core::{Collaborators, Orchestrator, RunResult, StateManager};
use crate::decision::{DecisionEngine, ScheduleCatalog};
use crate::domain::{ContentType, ManualOverride, MarketContext, ResearchBundle};
use crate::signal::{EventDetector, UrgencyScorer};

/// marketcast - breaking-news-aware content production orchestrator
#[derive(Parser, Debug)]
#[command(name = "marketcast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full production pipeline
    Run {
        /// Manual topic override (bypasses urgency and schedule logic)
        #[arg(long)]
        topic: Option<String>,

        /// Content type for the manual override
        #[arg(long, value_enum)]
        content_type: Option<CliContentType>,
    },

    /// Resume after a crash (restarts the pipeline if recoverable state exists)
    Resume,

    /// Show the persisted run state and recovery info
    Status {
        /// Print the raw state document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dry-run the decision logic against research text (no production stages)
    Decide {
        /// Research text file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Price change percent for the market context
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        price_change: f64,

        /// Hours since the originating event
        #[arg(long)]
        hours_since: Option<f64>,
    },

    /// Print the effective schedule catalog
    Schedule,

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliContentType {
    BreakingNews,
    Educational,
}

impl From<CliContentType> for ContentType {
    fn from(value: CliContentType) -> Self {
        match value {
            CliContentType::BreakingNews => ContentType::BreakingNews,
            CliContentType::Educational => ContentType::Educational,
        }
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = Config::from_env()?;

        match self.command {
            Commands::Run {
                topic,
                content_type,
            } => {
                let manual = topic.map(|topic| ManualOverride {
                    topic,
                    content_type: content_type
                        .map(ContentType::from)
                        .unwrap_or(ContentType::Educational),
                    angle: None,
                });

                let mut orchestrator = build_orchestrator(&config)?;
                let result = orchestrator.run(manual).await;
                finish(result)
            }

            Commands::Resume => {
                let mut orchestrator = build_orchestrator(&config)?;
                let result = orchestrator.resume().await;
                finish(result)
            }

            Commands::Status { json } => show_status(&config, json),

            Commands::Decide {
                input,
                price_change,
                hours_since,
            } => decide_dry_run(&config, input, price_change, hours_since),

            Commands::Schedule => {
                let catalog = load_catalog(&config)?;
                print!("{}", serde_yaml::to_string(&catalog)?);
                Ok(())
            }

            Commands::Config => {
                println!("{config:#?}");
                Ok(())
            }
        }
    }
}

/// Print the run result and map failure onto the exit code
fn finish(result: RunResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let deadline = Duration::from_secs(config.step_timeout_secs);

    let research_url = config
        .research_url
        .as_deref()
        .context("RESEARCH_URL must be set to run the pipeline")?;
    let script_cmd = config
        .script_cmd
        .as_deref()
        .context("SCRIPT_CMD must be set to run the pipeline")?;
    let render_cmd = config
        .render_cmd
        .as_deref()
        .context("RENDER_CMD must be set to run the pipeline")?;
    let upload_cmd = config
        .upload_cmd
        .as_deref()
        .context("UPLOAD_CMD must be set to run the pipeline")?;

    let collaborators = Collaborators {
        research: Arc::new(HttpResearchProvider::new(research_url, deadline)?),
        scripts: Arc::new(CommandScriptGenerator::new(script_cmd, deadline)),
        video: Arc::new(CommandVideoProducer::new(render_cmd, deadline)),
        uploader: Arc::new(CommandUploader::new(upload_cmd, deadline)),
    };

    Orchestrator::new(config, load_catalog(config)?, collaborators)
}

fn load_catalog(config: &Config) -> Result<ScheduleCatalog> {
    match &config.schedule_file {
        Some(path) => ScheduleCatalog::from_file(path),
        None => Ok(ScheduleCatalog::default()),
    }
}

fn show_status(config: &Config, json: bool) -> Result<()> {
    let state = StateManager::new(&config.state_file_path);

    let Some(run) = state.load()? else {
        println!("No persisted run state at {}", config.state_file_path.display());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    let info = run.recovery_info();
    println!("Run:          {}", info.run_id);
    println!("Status:       {:?}", info.status);
    println!("Started:      {}", info.start_time);
    println!(
        "Current step: {}",
        info.current_step.as_deref().unwrap_or("-")
    );
    println!("Completed:    {}", info.completed_steps.join(", "));
    if !info.failed_steps.is_empty() {
        println!("Failed:       {}", info.failed_steps.join(", "));
    }
    if let Some(error) = &run.error {
        println!("Error:        {error}");
    }
    println!(
        "Recoverable:  {}",
        if state.can_recover() { "yes" } else { "no" }
    );

    Ok(())
}

fn decide_dry_run(
    config: &Config,
    input: Option<PathBuf>,
    price_change: f64,
    hours_since: Option<f64>,
) -> Result<()> {
    let text = read_input(input)?;
    if text.trim().is_empty() {
        anyhow::bail!("No research text provided");
    }

    let detector = EventDetector::new()?;
    let scorer = UrgencyScorer::new(config.urgency_threshold);
    let engine = DecisionEngine::new()?;
    let catalog = load_catalog(config)?;

    let bundle = ResearchBundle::new(text);
    let market = MarketContext {
        price_change_percent: price_change,
        volume: None,
        hours_since_event: hours_since,
    };

    let report = scorer.score_research(&detector, &bundle, &market);
    let signal = engine.summarize(&report, &bundle, &market);
    let decision = engine.decide(&signal, &catalog, None)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "urgency": {
                "max_score": report.max_score,
                "should_override": report.should_override,
                "critical_count": report.critical_count,
                "high_count": report.high_count,
                "events": report.events.len(),
            },
            "decision": decision,
        }))?
    );

    Ok(())
}

/// Read research text from a file or stdin
fn read_input(input: Option<PathBuf>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}
