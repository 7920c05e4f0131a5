//! End-to-end tests for the out-of-process training driver.
//!
//! The driver is a small `sh` script, so these only run on unix.
#![cfg(unix)]

use ednn_core::{JsonCheckpoint, JsonCheckpointLoader, ProcessModelFactory, ProcessTrainer};
use ednn_training::{
    Device, DriverConfig, EnsembleConfig, LossMode, MemberSpec, ModelConfig, ModelFactory, NullProgressSink,
    OptimizerConfig, Orchestrator, ProgressEvent, ProgressSink, Trainer, TrainingError, TrainingJob,
    TrainingRunId,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Prints two epoch records and a chatter line, then writes a checkpoint at
/// `EDNN_RESUME_EPOCH + 2` (or 2 on a fresh start).
const DRIVER_SCRIPT: &str = r#"
test -f "$1" || exit 3
start=${EDNN_RESUME_EPOCH:-0}
e1=$((start + 1))
e2=$((start + 2))
echo "{\"epoch\":$e1,\"train_loss\":0.9,\"val_loss\":1.1}"
echo "seed=$EDNN_SEED device=$EDNN_DEVICE"
echo "{\"epoch\":$e2,\"train_loss\":0.7,\"val_loss\":0.8}"
printf '{"epoch":%d,"model_state":{"w":[1,2]},"optimizer_state":{"step":%d},"best_epoch":%d,"best_val_loss":0.8}' "$e2" "$e2" "$e2" > "$EDNN_CHECKPOINT_PATH"
"#;

fn sh_driver(script: &str) -> DriverConfig {
    DriverConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string(), "ednn-driver".to_string()],
    }
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressSink for CollectingSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn write_dataset(dir: &Path) -> PathBuf {
    let mut csv = (0..13).map(|c| format!("f{c}")).collect::<Vec<_>>().join(",");
    csv.push_str(",medv\n");
    for r in 0..20 {
        let row: Vec<String> = (0..14).map(|c| format!("{}", r * 3 + c)).collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    let path = dir.join("boston.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

fn config(temp: &TempDir, driver: DriverConfig) -> EnsembleConfig {
    let mut config = EnsembleConfig::default();
    config.dataset.csv_path = write_dataset(temp.path());
    config.output.model_save_base = temp.path().join("models");
    config.ensemble.size = 3;
    config.ensemble.epochs = 4;
    config.driver = driver;
    config
}

fn single_job(temp: &TempDir) -> TrainingJob {
    let config = config(temp, sh_driver(DRIVER_SCRIPT));
    let orch = Orchestrator::new(
        config.clone(),
        ProcessModelFactory,
        JsonCheckpointLoader,
        ProcessTrainer::new(config.driver.clone()),
    );
    let data = orch.prepare_data().unwrap();
    let checkpoint_path = orch.layout().ensure_mode_dir(LossMode::Mse).unwrap().join("model_0.pth");
    TrainingJob {
        run_id: TrainingRunId::new(),
        loss_mode: LossMode::Mse,
        metrics_token: LossMode::Mse.metrics_token(),
        member: MemberSpec::new(0, 42, ModelConfig::default(), OptimizerConfig::default()),
        checkpoint_path,
        device: Device::Cpu,
        epochs: 4,
        patience: 2,
        resume_epoch: None,
        dataset: ednn_training::DatasetRef {
            csv_path: config.dataset.csv_path.clone(),
            dataset_id: data.dataset.id().clone(),
            target_column: None,
        },
        train: data.train,
        val: data.val,
    }
}

#[tokio::test]
async fn test_driver_streams_epochs_and_leaves_checkpoint() {
    let temp = TempDir::new().unwrap();
    let job = single_job(&temp);
    let trainer = ProcessTrainer::new(sh_driver(DRIVER_SCRIPT));
    let mut member = ProcessModelFactory.build(&job.member, Device::Cpu).unwrap();
    let sink = CollectingSink::default();

    let outcome = trainer.train(&mut member, &job, &sink).await.unwrap();

    assert_eq!(outcome.final_epoch, Some(2));
    assert_eq!(outcome.best_epoch, Some(2));
    assert!(outcome.stopped_early);
    assert_eq!(member.restored.as_ref().map(|c| c.epoch), Some(2));
    assert!(ProcessTrainer::job_file_path(&job.checkpoint_path).exists());

    let events = sink.events.lock().unwrap();
    let epochs: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Epoch { epoch, total, .. } => {
                assert_eq!(*total, 4);
                Some(*epoch)
            }
            _ => None,
        })
        .collect();
    assert_eq!(epochs, vec![1, 2]);
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::Message { message, .. } if message == "seed=42 device=cpu"
    )));
}

#[tokio::test]
async fn test_failing_driver_reports_stderr_tail() {
    let temp = TempDir::new().unwrap();
    let job = single_job(&temp);
    let trainer = ProcessTrainer::new(sh_driver("echo 'loss is NaN' >&2; exit 4"));
    let mut member = ProcessModelFactory.build(&job.member, Device::Cpu).unwrap();

    let err = trainer.train(&mut member, &job, &NullProgressSink).await.unwrap_err();
    match err {
        TrainingError::Trainer(message) => assert!(message.contains("loss is NaN"), "{message}"),
        other => panic!("expected trainer error, got {other:?}"),
    }
}

/// Emits bytes that are not valid UTF-8 on both streams, then checkpoints.
const NOISY_DRIVER_SCRIPT: &str = r#"
printf 'progress \377\376 50%%\n'
printf 'cuda warning \377\n' >&2
echo "{\"epoch\":4,\"train_loss\":0.5,\"val_loss\":0.6}"
printf '{"epoch":4,"model_state":{},"optimizer_state":{}}' > "$EDNN_CHECKPOINT_PATH"
"#;

#[tokio::test]
async fn test_invalid_utf8_output_does_not_abort_training() {
    let temp = TempDir::new().unwrap();
    let job = single_job(&temp);
    let trainer = ProcessTrainer::new(sh_driver(NOISY_DRIVER_SCRIPT));
    let mut member = ProcessModelFactory.build(&job.member, Device::Cpu).unwrap();
    let sink = CollectingSink::default();

    let outcome = trainer.train(&mut member, &job, &sink).await.unwrap();
    assert_eq!(outcome.final_epoch, Some(4));
    assert!(!outcome.stopped_early);

    let events = sink.events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::Message { message, .. } if message == "progress \u{fffd}\u{fffd} 50%"
    )));
    assert!(events.iter().any(|e| matches!(e, ProgressEvent::Epoch { epoch: 4, .. })));
}

#[tokio::test]
async fn test_failing_driver_with_invalid_utf8_stderr_keeps_tail() {
    let temp = TempDir::new().unwrap();
    let job = single_job(&temp);
    let trainer = ProcessTrainer::new(sh_driver("printf 'bad \\377 state\\n' >&2; exit 2"));
    let mut member = ProcessModelFactory.build(&job.member, Device::Cpu).unwrap();

    let err = trainer.train(&mut member, &job, &NullProgressSink).await.unwrap_err();
    match err {
        TrainingError::Trainer(message) => assert!(message.contains("bad \u{fffd} state"), "{message}"),
        other => panic!("expected trainer error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_driver_program_is_a_trainer_error() {
    let temp = TempDir::new().unwrap();
    let job = single_job(&temp);
    let trainer = ProcessTrainer::new(DriverConfig {
        program: "ednn-driver-that-does-not-exist".to_string(),
        args: Vec::new(),
    });
    let mut member = ProcessModelFactory.build(&job.member, Device::Cpu).unwrap();

    let err = trainer.train(&mut member, &job, &NullProgressSink).await.unwrap_err();
    assert!(matches!(err, TrainingError::Trainer(_)));
}

#[tokio::test]
async fn test_orchestrated_rerun_resumes_from_driver_checkpoints() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp, sh_driver(DRIVER_SCRIPT));
    let base = config.output.model_save_base.clone();
    let build = |config: EnsembleConfig| {
        let trainer = ProcessTrainer::new(config.driver.clone());
        Orchestrator::new(config, ProcessModelFactory, JsonCheckpointLoader, trainer)
    };

    let first = build(config.clone()).run(Device::Cpu, &NullProgressSink).await.unwrap();
    assert_eq!(first.members.len(), 3);
    assert!(first.members.iter().all(|m| m.resumed_from.is_none()));
    assert!(first.members.iter().all(|m| m.outcome.final_epoch == Some(2)));

    let second = build(config).run(Device::Cpu, &NullProgressSink).await.unwrap();
    assert!(second.members.iter().all(|m| m.resumed_from == Some(2)));
    assert!(second.members.iter().all(|m| m.outcome.final_epoch == Some(4)));

    for i in 0..3 {
        let ckpt = JsonCheckpoint::read(&base.join("mse").join(format!("model_{i}.pth")))
            .unwrap()
            .unwrap();
        assert_eq!(ckpt.epoch, 4);
    }
    let found = ednn_training::discover_ensembles(&base).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].completed_members(), 3);
}
