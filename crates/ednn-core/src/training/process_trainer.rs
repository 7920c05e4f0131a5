use super::checkpoint::JsonCheckpoint;
use async_trait::async_trait;
use ednn_training::{
    Device, DriverConfig, MemberSpec, ModelFactory, ProgressEvent, ProgressSink, Trainer, TrainingError,
    TrainingJob, TrainingOutcome, TrainingResult,
};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

const STDERR_TAIL_LINES: usize = 20;

/// An ensemble member trained out of process.
///
/// Holds the description the driver needs to build the network itself plus
/// whatever checkpoint was restored for it.
#[derive(Debug, Clone)]
pub struct ProcessMember {
    pub spec: MemberSpec,
    pub device: Device,
    pub restored: Option<JsonCheckpoint>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessModelFactory;

impl ModelFactory for ProcessModelFactory {
    type Member = ProcessMember;

    fn build(&self, spec: &MemberSpec, device: Device) -> TrainingResult<ProcessMember> {
        spec.model.validate()?;
        spec.optimizer.validate()?;
        Ok(ProcessMember { spec: spec.clone(), device, restored: None })
    }
}

/// Per-epoch record a driver may print on stdout as a single JSON line.
#[derive(Debug, Deserialize)]
struct EpochRecord {
    epoch: u32,
    #[serde(default)]
    train_loss: Option<f64>,
    #[serde(default)]
    val_loss: Option<f64>,
}

/// Runs an external driver program once per member.
///
/// The job is written as JSON next to the checkpoint and its path is
/// appended to the configured arguments. The driver owns the checkpoint
/// file; it is re-read after the process exits.
#[derive(Debug, Clone)]
pub struct ProcessTrainer {
    config: DriverConfig,
}

impl ProcessTrainer {
    #[must_use]
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn job_file_path(checkpoint_path: &Path) -> PathBuf {
        checkpoint_path.with_extension("job.json")
    }

    fn command(&self, job: &TrainingJob, job_path: &Path) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .arg(job_path)
            .env("EDNN_JOB_FILE", job_path)
            .env("EDNN_CHECKPOINT_PATH", &job.checkpoint_path)
            .env("EDNN_DEVICE", job.device.as_str())
            .env("EDNN_SEED", job.member.seed.to_string())
            .env("EDNN_LOSS_MODE", job.loss_mode.as_str())
            .env("EDNN_METRICS_TOKEN", job.metrics_token.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        match job.resume_epoch {
            Some(epoch) => cmd.env("EDNN_RESUME_EPOCH", epoch.to_string()),
            None => cmd.env_remove("EDNN_RESUME_EPOCH"),
        };
        cmd
    }
}

/// Next line with invalid UTF-8 replaced, or `None` at end of stream.
async fn next_line_lossy<R: AsyncBufRead + Unpin>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf.as_slice());
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

async fn pump_stdout<R: AsyncRead + Unpin>(
    stdout: R,
    job: &TrainingJob,
    progress: &dyn ProgressSink,
) -> std::io::Result<Option<EpochRecord>> {
    let mut last = None;
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    while let Some(line) = next_line_lossy(&mut reader, &mut buf).await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = trimmed
            .starts_with('{')
            .then(|| serde_json::from_str::<EpochRecord>(trimmed).ok())
            .flatten();
        match record {
            Some(record) => {
                progress.on_event(ProgressEvent::Epoch {
                    loss_mode: job.loss_mode,
                    index: job.member.index,
                    epoch: record.epoch,
                    total: job.epochs,
                    train_loss: record.train_loss,
                    val_loss: record.val_loss,
                });
                last = Some(record);
            }
            None => progress.on_event(ProgressEvent::Message {
                loss_mode: job.loss_mode,
                index: job.member.index,
                message: trimmed.to_string(),
            }),
        }
    }
    Ok(last)
}

async fn stderr_tail<R: AsyncRead + Unpin>(stderr: R) -> std::io::Result<Vec<String>> {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    while let Some(line) = next_line_lossy(&mut reader, &mut buf).await? {
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Ok(tail.into())
}

#[async_trait]
impl Trainer<ProcessMember> for ProcessTrainer {
    fn id(&self) -> &'static str {
        "process"
    }

    async fn train(
        &self,
        member: &mut ProcessMember,
        job: &TrainingJob,
        progress: &dyn ProgressSink,
    ) -> TrainingResult<TrainingOutcome> {
        job.validate()?;
        if member.spec != job.member {
            return Err(TrainingError::Trainer(format!(
                "member {} does not match job for member {}",
                member.spec.index, job.member.index
            )));
        }

        let job_path = Self::job_file_path(&job.checkpoint_path);
        std::fs::write(&job_path, serde_json::to_vec_pretty(job)?)?;

        info!(
            program = %self.config.program,
            job = %job_path.display(),
            resume_epoch = ?job.resume_epoch,
            "launching training driver"
        );

        let mut child = self.command(job, &job_path).spawn().map_err(|e| {
            TrainingError::Trainer(format!("failed to launch {}: {e}", self.config.program))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TrainingError::Trainer("driver stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TrainingError::Trainer("driver stderr was not captured".to_string()))?;

        let (last_record, tail) = tokio::try_join!(pump_stdout(stdout, job, progress), stderr_tail(stderr))?;
        let status = child.wait().await?;

        if !status.success() {
            warn!(status = %status, index = job.member.index, "training driver failed");
            let mut message = format!("{} exited with {status}", self.config.program);
            if !tail.is_empty() {
                message.push_str(":\n");
                message.push_str(&tail.join("\n"));
            }
            return Err(TrainingError::Trainer(message));
        }

        let checkpoint = JsonCheckpoint::read(&job.checkpoint_path)?;
        let outcome = match &checkpoint {
            Some(ckpt) => TrainingOutcome {
                final_epoch: Some(ckpt.epoch),
                best_epoch: ckpt.best_epoch,
                best_val_loss: ckpt.best_val_loss,
                // epochs are 1-based; a full run ends with epoch == job.epochs
                stopped_early: ckpt.epoch < job.epochs,
            },
            None => {
                warn!(path = %job.checkpoint_path.display(), "driver exited without writing a checkpoint");
                TrainingOutcome {
                    final_epoch: last_record.as_ref().map(|r| r.epoch),
                    ..Default::default()
                }
            }
        };
        debug!(index = job.member.index, outcome = ?outcome, "training driver finished");

        member.restored = checkpoint;
        Ok(outcome)
    }
}
