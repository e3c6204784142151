//! Collaborator interfaces for the production stages.
//!
//! Everything outside the decision/orchestration core — research fetching,
//! script generation and review, video rendering, branding, upload — sits
//! behind these traits. Implementations tag every failure with the stage
//! and an [`ErrorKind`](crate::core::ErrorKind) chosen at the point of
//! origin.

pub mod command;
pub mod http_research;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::StageError;
use crate::domain::{Decision, MarketContext, ResearchBundle};

// Re-export the shipped implementations
pub use command::{CommandScriptGenerator, CommandUploader, CommandVideoProducer};
pub use http_research::HttpResearchProvider;

/// Research bundle plus the market context it was gathered under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPayload {
    pub bundle: ResearchBundle,
    pub market: MarketContext,
}

/// A generated (and possibly reviewed) video script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    pub body: String,

    /// Set once the script has passed review
    pub reviewed: bool,
}

/// A rendered video on local disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub path: std::path::PathBuf,

    /// Set once brand overlays have been applied
    pub branded: bool,
}

/// Proof of a completed upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub video_id: String,
    pub url: String,
}

/// Fetches market research and context
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<ResearchPayload, StageError>;
}

/// Generates and reviews video scripts
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, decision: &Decision) -> Result<Script, StageError>;

    async fn review(&self, script: Script) -> Result<Script, StageError>;
}

/// Renders videos and applies brand overlays
#[async_trait]
pub trait VideoProducer: Send + Sync {
    fn name(&self) -> &str;

    async fn render(&self, script: &Script) -> Result<VideoArtifact, StageError>;

    async fn apply_branding(
        &self,
        video: VideoArtifact,
        decision: &Decision,
    ) -> Result<VideoArtifact, StageError>;
}

/// Publishes the finished video
#[async_trait]
pub trait Uploader: Send + Sync {
    fn name(&self) -> &str;

    async fn upload(
        &self,
        video: &VideoArtifact,
        decision: &Decision,
    ) -> Result<UploadReceipt, StageError>;
}
