//! Subprocess-backed collaborators.
//!
//! Each collaborator spawns a configured binary, pipes a JSON request to
//! stdin, and reads the response from stdout. Non-zero exit maps to an
//! upstream failure with stderr attached; exceeding the deadline maps to
//! a timeout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::{Stage, StageError};
use crate::domain::Decision;

use super::{Script, ScriptGenerator, UploadReceipt, Uploader, VideoArtifact, VideoProducer};

/// Spawns a configured binary and exchanges JSON over stdin/stdout
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    deadline: Duration,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>, deadline: Duration) -> Self {
        Self {
            program: program.into(),
            deadline,
        }
    }

    /// Run `program <action>`, piping `payload` to stdin and returning
    /// trimmed stdout.
    async fn run(&self, stage: Stage, action: &str, payload: &str) -> Result<String, StageError> {
        let mut child = Command::new(&self.program)
            .arg(action)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                StageError::io(stage, format!("failed to spawn '{}': {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(payload.as_bytes()).await.map_err(|e| {
                StageError::io(stage, format!("failed to write to '{}': {}", self.program, e))
            })?;
            // Drop stdin to signal EOF
        }

        let output = timeout(self.deadline, child.wait_with_output())
            .await
            .map_err(|_| {
                StageError::timeout(
                    stage,
                    format!("'{}' exceeded {:?} deadline", self.program, self.deadline),
                )
            })?
            .map_err(|e| {
                StageError::io(stage, format!("failed to wait for '{}': {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            return Err(StageError::upstream(
                stage,
                format!(
                    "'{}' exited with code {}: {}",
                    self.program,
                    exit_code,
                    stderr.trim()
                ),
            ));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            StageError::invalid_output(stage, format!("'{}' produced non-UTF-8 output", self.program))
        })?;

        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Err(StageError::invalid_output(
                stage,
                format!("'{}' produced no output", self.program),
            ));
        }

        Ok(trimmed.to_string())
    }

    fn encode<T: Serialize>(&self, stage: Stage, value: &T) -> Result<String, StageError> {
        serde_json::to_string(value)
            .map_err(|e| StageError::io(stage, format!("failed to encode request: {e}")))
    }
}

/// Script generation via an external writer command.
///
/// `<cmd> generate` receives the decision JSON and prints the script body;
/// `<cmd> review` receives the draft body and prints the revised body.
pub struct CommandScriptGenerator {
    runner: CommandRunner,
}

impl CommandScriptGenerator {
    pub fn new(program: impl Into<String>, deadline: Duration) -> Self {
        Self {
            runner: CommandRunner::new(program, deadline),
        }
    }
}

#[async_trait]
impl ScriptGenerator for CommandScriptGenerator {
    fn name(&self) -> &str {
        "command-script"
    }

    async fn generate(&self, decision: &Decision) -> Result<Script, StageError> {
        let stage = Stage::ScriptGeneration;
        let payload = self.runner.encode(stage, decision)?;
        let body = self.runner.run(stage, "generate", &payload).await?;

        Ok(Script {
            title: decision.topic.title.clone(),
            body,
            reviewed: false,
        })
    }

    async fn review(&self, script: Script) -> Result<Script, StageError> {
        let body = self
            .runner
            .run(Stage::ScriptReview, "review", &script.body)
            .await?;

        Ok(Script {
            body,
            reviewed: true,
            ..script
        })
    }
}

/// Video rendering and branding via an external producer command.
///
/// `<cmd> render` receives the script JSON and prints the rendered file
/// path; `<cmd> brand` receives `{path, decision}` and prints the branded
/// file path.
pub struct CommandVideoProducer {
    runner: CommandRunner,
}

impl CommandVideoProducer {
    pub fn new(program: impl Into<String>, deadline: Duration) -> Self {
        Self {
            runner: CommandRunner::new(program, deadline),
        }
    }
}

#[async_trait]
impl VideoProducer for CommandVideoProducer {
    fn name(&self) -> &str {
        "command-video"
    }

    async fn render(&self, script: &Script) -> Result<VideoArtifact, StageError> {
        let stage = Stage::VideoProduction;
        let payload = self.runner.encode(stage, script)?;
        let path = self.runner.run(stage, "render", &payload).await?;

        Ok(VideoArtifact {
            path: path.into(),
            branded: false,
        })
    }

    async fn apply_branding(
        &self,
        video: VideoArtifact,
        decision: &Decision,
    ) -> Result<VideoArtifact, StageError> {
        let stage = Stage::BrandOverlay;
        let payload = self.runner.encode(
            stage,
            &serde_json::json!({
                "path": video.path,
                "thumbnail_style": decision.metadata.thumbnail_style,
                "content_type": decision.content_type,
            }),
        )?;
        let path = self.runner.run(stage, "brand", &payload).await?;

        Ok(VideoArtifact {
            path: path.into(),
            branded: true,
        })
    }
}

/// Upload via an external publisher command.
///
/// `<cmd> upload` receives `{path, title, tags, hashtags}` and prints a
/// JSON receipt `{"video_id": ..., "url": ...}`.
pub struct CommandUploader {
    runner: CommandRunner,
}

impl CommandUploader {
    pub fn new(program: impl Into<String>, deadline: Duration) -> Self {
        Self {
            runner: CommandRunner::new(program, deadline),
        }
    }
}

#[async_trait]
impl Uploader for CommandUploader {
    fn name(&self) -> &str {
        "command-upload"
    }

    async fn upload(
        &self,
        video: &VideoArtifact,
        decision: &Decision,
    ) -> Result<UploadReceipt, StageError> {
        let stage = Stage::Upload;
        let payload = self.runner.encode(
            stage,
            &serde_json::json!({
                "path": video.path,
                "title": decision.topic.title,
                "tags": decision.metadata.tags,
                "hashtags": decision.metadata.hashtags,
                "priority": decision.metadata.priority,
            }),
        )?;

        let response = self.runner.run(stage, "upload", &payload).await?;

        serde_json::from_str(&response).map_err(|e| {
            StageError::invalid_output(stage, format!("unparseable upload receipt: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(program: &str) -> CommandRunner {
        CommandRunner::new(program, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let err = runner("definitely-not-a-real-binary")
            .run(Stage::VideoProduction, "render", "{}")
            .await
            .unwrap_err();

        assert_eq!(err.kind, crate::core::ErrorKind::Io);
        assert!(!err.retryable());
    }

    #[tokio::test]
    async fn test_stdout_roundtrip() {
        // `cat -` echoes stdin back, standing in for a well-behaved command
        let out = runner("cat")
            .run(Stage::ScriptReview, "-", "reviewed body")
            .await
            .unwrap();
        assert_eq!(out, "reviewed body");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_upstream_error() {
        let err = runner("false")
            .run(Stage::Upload, "upload", "{}")
            .await
            .unwrap_err();

        assert_eq!(err.kind, crate::core::ErrorKind::Upstream);
        assert!(err.retryable());
    }
}
