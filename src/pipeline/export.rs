use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{PipelineError, Result};
use crate::naming;
use crate::pipeline::pose::Pose;
use crate::scheduler::JobDescriptor;
use crate::source;
use crate::worker::ItemTransform;

/// The pose-estimation model, treated as an opaque external collaborator.
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    async fn estimate(&self, image_path: &Path) -> Result<Pose>;
}

/// Estimator that delegates to an external command.
///
/// The command is invoked with the image path appended as its final
/// argument and must print the pose as JSON on stdout. This keeps the model
/// itself out of the process while letting the batch scheduler drive it.
#[derive(Debug, Clone)]
pub struct CommandEstimator {
    program: String,
    args: Vec<String>,
}

impl CommandEstimator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line into program and arguments.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| PipelineError::Estimator("empty estimator command".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl PoseEstimator for CommandEstimator {
    async fn estimate(&self, image_path: &Path) -> Result<Pose> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                format!("exit code {:?}", output.status.code())
            } else {
                stderr.trim().to_string()
            };
            return Err(PipelineError::Estimator(message));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// Item transform for the export pipeline: image in, `<base>.json` out.
pub struct PoseExportTransform {
    input_dir: PathBuf,
    output_dir: PathBuf,
    estimator: Arc<dyn PoseEstimator>,
}

impl PoseExportTransform {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        estimator: Arc<dyn PoseEstimator>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            estimator,
        }
    }
}

#[async_trait]
impl ItemTransform for PoseExportTransform {
    async fn apply(&self, job: &JobDescriptor) -> Result<()> {
        // The job source filters the sentinel already; skip as a no-op if
        // one slips through.
        if source::is_hidden(&job.input_ref) {
            tracing::warn!(input = %job.input_ref, "Hidden input reached a worker, skipping");
            return Ok(());
        }

        let image_path = self.input_dir.join(&job.input_ref);
        let pose = self.estimator.estimate(&image_path).await?;

        let output_path = self.output_dir.join(naming::pose_file_name(&job.input_ref));
        let json = serde_json::to_vec(&pose)?;
        tokio::fs::write(&output_path, json).await?;

        tracing::info!(output = %output_path.display(), "Saved pose");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_splitting() {
        let est = CommandEstimator::from_command_line("python3 estimate.py --quiet").unwrap();
        assert_eq!(est.program, "python3");
        assert_eq!(est.args, vec!["estimate.py", "--quiet"]);
    }

    #[test]
    fn empty_command_line_rejected() {
        assert!(CommandEstimator::from_command_line("   ").is_err());
    }
}
