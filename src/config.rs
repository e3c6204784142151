//! Runtime configuration, sourced from the environment.
//!
//! Every knob has a default; invalid values are errors rather than
//! silent fallbacks. The resulting struct is plain data passed by
//! reference — there is no global config state.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Urgency score at or above which breaking news overrides the
    /// schedule (0-10)
    pub urgency_threshold: f64,

    /// Retries per stage after the first attempt (0-10)
    pub max_retries: u32,

    /// Base retry delay in milliseconds
    pub retry_delay_ms: u64,

    /// Ceiling for the exponential backoff delay
    pub max_retry_delay_ms: u64,

    /// Path of the single-slot pipeline state document
    pub state_file_path: PathBuf,

    /// Per-collaborator-call deadline in seconds
    pub step_timeout_secs: u64,

    /// Research endpoint URL (required to run the full pipeline)
    pub research_url: Option<String>,

    /// External script writer command
    pub script_cmd: Option<String>,

    /// External video producer command
    pub render_cmd: Option<String>,

    /// External upload command
    pub upload_cmd: Option<String>,

    /// Optional YAML schedule catalog; the built-in default is used
    /// when unset
    pub schedule_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urgency_threshold: 7.0,
            max_retries: 3,
            retry_delay_ms: 5000,
            max_retry_delay_ms: 60_000,
            state_file_path: PathBuf::from("./pipeline_state.json"),
            step_timeout_secs: 300,
            research_url: None,
            script_cmd: None,
            render_cmd: None,
            upload_cmd: None,
            schedule_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, validating ranges.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            urgency_threshold: env_parse("URGENCY_THRESHOLD")?
                .unwrap_or(defaults.urgency_threshold),
            max_retries: env_parse("MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            retry_delay_ms: env_parse("RETRY_DELAY_MS")?.unwrap_or(defaults.retry_delay_ms),
            max_retry_delay_ms: env_parse("MAX_RETRY_DELAY_MS")?
                .unwrap_or(defaults.max_retry_delay_ms),
            state_file_path: std::env::var("STATE_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_file_path),
            step_timeout_secs: env_parse("STEP_TIMEOUT_SECS")?
                .unwrap_or(defaults.step_timeout_secs),
            research_url: std::env::var("RESEARCH_URL").ok(),
            script_cmd: std::env::var("SCRIPT_CMD").ok(),
            render_cmd: std::env::var("RENDER_CMD").ok(),
            upload_cmd: std::env::var("UPLOAD_CMD").ok(),
            schedule_file: std::env::var("SCHEDULE_FILE").ok().map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=10.0).contains(&self.urgency_threshold) {
            anyhow::bail!(
                "URGENCY_THRESHOLD must be within 0-10, got {}",
                self.urgency_threshold
            );
        }
        if self.max_retries > 10 {
            anyhow::bail!("MAX_RETRIES must be within 0-10, got {}", self.max_retries);
        }
        if self.max_retry_delay_ms < self.retry_delay_ms {
            anyhow::bail!(
                "MAX_RETRY_DELAY_MS ({}) must not be below RETRY_DELAY_MS ({})",
                self.max_retry_delay_ms,
                self.retry_delay_ms
            );
        }
        Ok(())
    }
}

/// Parse an env var, distinguishing "unset" from "unparseable"
fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {name}: '{raw}'"))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}
