//! Ensemble orchestration.
//!
//! Loads the dataset and split once, then walks `loss_modes × 0..size`,
//! building each member, probing its checkpoint and handing one job to the
//! trainer. Members train sequentially and independently; the first error
//! aborts the run.

use crate::artifacts::{hash_if_present, EnsembleManifest, MemberArtifact};
use crate::config::EnsembleConfig;
use crate::dataset::{DatasetId, TabularDataset};
use crate::error::{TrainingError, TrainingResult};
use crate::job::{DatasetRef, Device, MemberSpec, TrainingJob, TrainingRunId};
use crate::layout::CheckpointLayout;
use crate::loss::{LossMode, MetricsToken};
use crate::metrics::MetricsRegistry;
use crate::progress::{NullProgressSink, ProgressEvent, ProgressSink};
use crate::split::{random_split, DataLoader, Split};
use crate::trainer::{CheckpointLoader, ModelFactory, Trainer, TrainingOutcome};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Dataset, split and loaders shared read-only by every member of a run.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub dataset: TabularDataset,
    pub split: Split,
    pub train: DataLoader,
    pub val: DataLoader,
}

/// One member as it would be dispatched, without training it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedMember {
    pub loss_mode: LossMode,
    pub index: usize,
    pub seed: u64,
    pub metrics_token: MetricsToken,
    pub checkpoint_path: PathBuf,
    pub resume_epoch: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberReport {
    pub loss_mode: LossMode,
    pub index: usize,
    pub seed: u64,
    pub metrics_token: MetricsToken,
    pub checkpoint_path: PathBuf,
    pub resumed_from: Option<u32>,
    pub outcome: TrainingOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: TrainingRunId,
    pub device: Device,
    pub dataset_id: DatasetId,
    pub train_size: usize,
    pub val_size: usize,
    pub members: Vec<MemberReport>,
}

pub struct Orchestrator<F, L, T> {
    config: EnsembleConfig,
    factory: F,
    loader: L,
    trainer: T,
    registry: MetricsRegistry,
}

impl<F, L, T> Orchestrator<F, L, T>
where
    F: ModelFactory,
    L: CheckpointLoader<F::Member>,
    T: Trainer<F::Member>,
{
    #[must_use]
    pub fn new(config: EnsembleConfig, factory: F, loader: L, trainer: T) -> Self {
        Self { config, factory, loader, trainer, registry: MetricsRegistry::default() }
    }

    #[must_use]
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    #[must_use]
    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    #[must_use]
    pub fn layout(&self) -> CheckpointLayout {
        CheckpointLayout::new(self.config.output.model_save_base.clone())
    }

    pub fn prepare_data(&self) -> TrainingResult<PreparedData> {
        self.config.validate()?;

        let dataset = TabularDataset::from_csv(
            &self.config.dataset.csv_path,
            self.config.dataset.target_column.as_deref(),
        )?;
        if dataset.feature_dim() != self.config.model.input_dim {
            return Err(TrainingError::InvalidConfig(format!(
                "model.input_dim is {} but {} has {} feature columns ({})",
                self.config.model.input_dim,
                dataset.source().display(),
                dataset.feature_dim(),
                dataset.feature_names().join(", ")
            )));
        }

        let split = random_split(dataset.len(), self.config.split.train_fraction, self.config.seed)?;
        let batch_size = self.config.split.batch_size;
        let train = DataLoader::new(split.train.clone(), batch_size, true, self.config.seed)?;
        let val = DataLoader::new(split.val.clone(), batch_size, false, self.config.seed)?;

        info!(
            dataset = %dataset.source().display(),
            dataset_id = %dataset.id(),
            rows = dataset.len(),
            target = dataset.target_name(),
            train = split.train_size(),
            val = split.val_size(),
            "prepared dataset"
        );

        Ok(PreparedData { dataset, split, train, val })
    }

    /// Build the member, announce it, probe its checkpoint and assemble its job.
    fn dispatch_member(
        &self,
        data: &PreparedData,
        run_id: &TrainingRunId,
        loss_mode: LossMode,
        index: usize,
        device: Device,
        progress: &dyn ProgressSink,
    ) -> TrainingResult<(F::Member, TrainingJob)> {
        let spec = MemberSpec::new(
            index,
            self.config.seed,
            self.config.model.clone(),
            self.config.optimizer.clone(),
        );
        let mut member = self.factory.build(&spec, device)?;

        progress.on_event(ProgressEvent::MemberStarted { loss_mode, index, total: self.config.ensemble.size });

        let checkpoint_path = self.layout().member_checkpoint_path(loss_mode, index);
        let checkpoint = self.loader.load(&mut member, &checkpoint_path, device)?;
        if let Some(info) = checkpoint {
            progress.on_event(ProgressEvent::Resuming { loss_mode, index, epoch: info.epoch });
        }

        debug!(
            loss_mode = %loss_mode,
            index,
            seed = spec.seed,
            checkpoint = %checkpoint_path.display(),
            resume_epoch = ?checkpoint.map(|c| c.epoch),
            "dispatching member"
        );

        let job = TrainingJob {
            run_id: run_id.clone(),
            loss_mode,
            metrics_token: loss_mode.metrics_token(),
            member: spec,
            checkpoint_path,
            device,
            epochs: self.config.ensemble.epochs,
            patience: self.config.ensemble.patience,
            resume_epoch: checkpoint.map(|c| c.epoch),
            dataset: DatasetRef {
                csv_path: self.config.dataset.csv_path.clone(),
                dataset_id: data.dataset.id().clone(),
                target_column: self.config.dataset.target_column.clone(),
            },
            train: data.train.clone(),
            val: data.val.clone(),
        };
        job.validate()?;
        Ok((member, job))
    }

    /// Compute every job of a run without creating directories or training.
    pub fn plan(&self, device: Device) -> TrainingResult<Vec<PlannedMember>> {
        let data = self.prepare_data()?;
        let run_id = TrainingRunId::new();
        let mut planned = Vec::new();

        for &loss_mode in &self.config.ensemble.loss_modes {
            for index in 0..self.config.ensemble.size {
                let (_member, job) =
                    self.dispatch_member(&data, &run_id, loss_mode, index, device, &NullProgressSink)?;
                planned.push(PlannedMember {
                    loss_mode,
                    index,
                    seed: job.member.seed,
                    metrics_token: job.metrics_token,
                    checkpoint_path: job.checkpoint_path,
                    resume_epoch: job.resume_epoch,
                });
            }
        }
        Ok(planned)
    }

    /// Train every member of every configured loss mode.
    pub async fn run(&self, device: Device, progress: &dyn ProgressSink) -> TrainingResult<RunSummary> {
        let data = self.prepare_data()?;
        let run_id = TrainingRunId::new();
        let layout = self.layout();
        let total = self.config.ensemble.size;

        info!(run_id = %run_id, trainer = self.trainer.id(), device = %device, "starting ensemble run");
        progress.on_event(ProgressEvent::RunStarted { run_id: run_id.clone(), tokens: self.registry.describe() });

        let mut reports = Vec::new();
        for &loss_mode in &self.config.ensemble.loss_modes {
            layout.ensure_mode_dir(loss_mode)?;
            let mut artifacts = Vec::with_capacity(total);

            for index in 0..total {
                let (mut member, job) = self.dispatch_member(&data, &run_id, loss_mode, index, device, progress)?;

                let outcome = self.trainer.train(&mut member, &job, progress).await?;

                progress.on_event(ProgressEvent::MemberFinished { loss_mode, index, final_epoch: outcome.final_epoch });
                info!(loss_mode = %loss_mode, index, final_epoch = ?outcome.final_epoch, "member finished");

                artifacts.push(MemberArtifact {
                    index,
                    seed: job.member.seed,
                    checkpoint_path: job.checkpoint_path.clone(),
                    sha256: hash_if_present(&job.checkpoint_path)?,
                    resumed_from: job.resume_epoch,
                    outcome: outcome.clone(),
                });
                reports.push(MemberReport {
                    loss_mode,
                    index,
                    seed: job.member.seed,
                    metrics_token: job.metrics_token,
                    checkpoint_path: job.checkpoint_path,
                    resumed_from: job.resume_epoch,
                    outcome,
                });
            }

            let manifest = EnsembleManifest {
                run_id: run_id.clone(),
                created_at: chrono::Utc::now(),
                loss_mode,
                metrics_token: loss_mode.metrics_token(),
                trainer: self.trainer.id().to_string(),
                device,
                dataset_id: data.dataset.id().clone(),
                members: artifacts,
            };
            manifest.write(&layout.ensemble_manifest_path(loss_mode))?;
        }

        progress.on_event(ProgressEvent::RunFinished { run_id: run_id.clone(), members: reports.len() });

        Ok(RunSummary {
            run_id,
            device,
            dataset_id: data.dataset.id().clone(),
            train_size: data.split.train_size(),
            val_size: data.split.val_size(),
            members: reports,
        })
    }
}
