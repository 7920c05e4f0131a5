use crate::job::TrainingRunId;
use crate::loss::LossMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    RunStarted { run_id: TrainingRunId, tokens: Vec<String> },
    MemberStarted { loss_mode: LossMode, index: usize, total: usize },
    /// A checkpoint was found for the member announced just before.
    Resuming { loss_mode: LossMode, index: usize, epoch: u32 },
    Message { loss_mode: LossMode, index: usize, message: String },
    Epoch { loss_mode: LossMode, index: usize, epoch: u32, total: u32, train_loss: Option<f64>, val_loss: Option<f64> },
    MemberFinished { loss_mode: LossMode, index: usize, final_epoch: Option<u32> },
    RunFinished { run_id: TrainingRunId, members: usize },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

#[derive(Debug, Default)]
pub struct StdoutProgressSink;

impl ProgressSink for StdoutProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { tokens, .. } => {
                println!("Available tokens: ");
                for token in tokens {
                    println!("  {token}");
                }
            }
            ProgressEvent::MemberStarted { loss_mode, index, total } => {
                println!("[{}] Training model {}/{total}...", loss_mode.as_str().to_uppercase(), index + 1);
            }
            ProgressEvent::Resuming { loss_mode, index, epoch } => {
                println!("[{}:{index}] resuming after epoch {epoch}", loss_mode.as_str().to_uppercase());
            }
            ProgressEvent::Message { loss_mode, index, message } => {
                println!("[{}:{index}] {message}", loss_mode.as_str().to_uppercase());
            }
            ProgressEvent::Epoch { loss_mode, index, epoch, total, train_loss, val_loss } => {
                let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
                println!(
                    "[{}:{index}] epoch {epoch}/{total} train_loss={} val_loss={}",
                    loss_mode.as_str().to_uppercase(),
                    fmt(train_loss),
                    fmt(val_loss)
                );
            }
            ProgressEvent::MemberFinished { .. } => {}
            ProgressEvent::RunFinished { members, .. } => println!("Finished training {members} model(s)"),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_event(&self, _event: ProgressEvent) {}
}
