//! Per-job generation workflow.
//!
//! Drives one job through the two upstream stages:
//!
//! ```text
//! CREATED -> PREVIEW_SUBMITTED -> PREVIEW_POLLING -> PREVIEW_DOWNLOADED
//!         -> REFINE_SUBMITTED  -> REFINE_POLLING  -> REFINE_DOWNLOADED -> COMPLETED
//! ```
//!
//! Any error from any non-terminal phase ends the job as `FAILED`. Each
//! upstream task is submitted at most once; nothing is retried.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use meshforge_core::error::CoreError;
use meshforge_core::job::{stage_progress, ModelFile, ModelUrls};
use meshforge_core::naming::{asset_filename, Stage};
use meshforge_meshy::{GenerationGateway, MeshyApiError};
use tokio_util::sync::CancellationToken;

use crate::config::WorkflowConfig;
use crate::engine::store::JobStore;
use crate::storage::{AssetStorage, StorageError};

/// Where a workflow currently is. Used for logging and failure context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Created,
    PreviewSubmitted,
    PreviewPolling,
    PreviewDownloaded,
    RefineSubmitted,
    RefinePolling,
    RefineDownloaded,
    Completed,
    Failed,
}

impl WorkflowPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowPhase::Created => "CREATED",
            WorkflowPhase::PreviewSubmitted => "PREVIEW_SUBMITTED",
            WorkflowPhase::PreviewPolling => "PREVIEW_POLLING",
            WorkflowPhase::PreviewDownloaded => "PREVIEW_DOWNLOADED",
            WorkflowPhase::RefineSubmitted => "REFINE_SUBMITTED",
            WorkflowPhase::RefinePolling => "REFINE_POLLING",
            WorkflowPhase::RefineDownloaded => "REFINE_DOWNLOADED",
            WorkflowPhase::Completed => "COMPLETED",
            WorkflowPhase::Failed => "FAILED",
        }
    }

    fn submitted(stage: Stage) -> Self {
        match stage {
            Stage::Preview => WorkflowPhase::PreviewSubmitted,
            Stage::Refined => WorkflowPhase::RefineSubmitted,
        }
    }

    fn polling(stage: Stage) -> Self {
        match stage {
            Stage::Preview => WorkflowPhase::PreviewPolling,
            Stage::Refined => WorkflowPhase::RefinePolling,
        }
    }

    fn downloaded(stage: Stage) -> Self {
        match stage {
            Stage::Preview => WorkflowPhase::PreviewDownloaded,
            Stage::Refined => WorkflowPhase::RefineDownloaded,
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a workflow ends in `FAILED`. The display text becomes the job's
/// `error` field.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{stage} request failed: {source}")]
    Gateway { stage: Stage, source: MeshyApiError },

    #[error("{stage} task ended with status {status}: {message}")]
    TaskFailed {
        stage: Stage,
        status: String,
        message: String,
    },

    #[error("{stage} task succeeded without a GLB model URL")]
    MissingAsset { stage: Stage },

    #[error("{stage} task unfinished after {attempts} status checks")]
    PollLimitExceeded { stage: Stage, attempts: u32 },

    #[error("failed to store {stage} model: {source}")]
    Storage { stage: Stage, source: StorageError },

    #[error("job record rejected update: {0}")]
    Store(#[from] CoreError),

    #[error("job cancelled: server shutting down")]
    Cancelled,
}

/// Runs generation workflows against a gateway, recording progress in the
/// job store and writing finished models to asset storage.
pub struct WorkflowEngine {
    gateway: Arc<dyn GenerationGateway>,
    store: Arc<JobStore>,
    storage: Arc<AssetStorage>,
    public_base_url: String,
    poll_interval: Duration,
    max_poll_attempts: Option<u32>,
    shutdown: CancellationToken,
}

impl WorkflowEngine {
    pub fn new(
        gateway: Arc<dyn GenerationGateway>,
        store: Arc<JobStore>,
        storage: Arc<AssetStorage>,
        public_base_url: &str,
        config: &WorkflowConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            store,
            storage,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            poll_interval: config.poll_interval,
            max_poll_attempts: config.max_poll_attempts,
            shutdown,
        }
    }

    /// Token that aborts every running workflow when cancelled.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Drive `job_id` to a terminal state. Never returns an error: every
    /// failure is recorded on the job instead.
    pub async fn run(&self, job_id: &str, prompt: &str) {
        tracing::info!(job_id, "Workflow started");

        let outcome = tokio::select! {
            result = self.execute(job_id, prompt) => result,
            () = self.shutdown.cancelled() => Err(WorkflowError::Cancelled),
        };

        match outcome {
            Ok(model_urls) => {
                match self
                    .store
                    .update(job_id, |job| job.complete(model_urls, Utc::now()))
                    .await
                {
                    Ok(()) => tracing::info!(
                        job_id,
                        phase = %WorkflowPhase::Completed,
                        "Workflow completed",
                    ),
                    Err(e) => tracing::error!(job_id, error = %e, "Failed to mark job completed"),
                }
            }
            Err(err) => self.fail_job(job_id, &err).await,
        }
    }

    /// Record `err` on the job and move it to `FAILED`.
    pub async fn fail_job(&self, job_id: &str, err: &WorkflowError) {
        tracing::error!(
            job_id,
            phase = %WorkflowPhase::Failed,
            error = %err,
            "Workflow failed",
        );

        let message = err.to_string();
        if let Err(e) = self
            .store
            .update(job_id, |job| job.fail(message, Utc::now()))
            .await
        {
            tracing::error!(job_id, error = %e, "Failed to mark job as failed");
        }
    }

    async fn execute(&self, job_id: &str, prompt: &str) -> Result<ModelUrls, WorkflowError> {
        let preview_task_id = self
            .gateway
            .submit_preview(prompt)
            .await
            .map_err(|source| WorkflowError::Gateway {
                stage: Stage::Preview,
                source,
            })?;
        self.enter(job_id, WorkflowPhase::submitted(Stage::Preview), &preview_task_id);

        let preview_url = self
            .poll_until_done(job_id, Stage::Preview, &preview_task_id)
            .await?;
        let preview = self.download(job_id, Stage::Preview, preview_url).await?;

        let refine_task_id = self
            .gateway
            .submit_refine(&preview_task_id)
            .await
            .map_err(|source| WorkflowError::Gateway {
                stage: Stage::Refined,
                source,
            })?;
        self.enter(job_id, WorkflowPhase::submitted(Stage::Refined), &refine_task_id);

        let refined_url = self
            .poll_until_done(job_id, Stage::Refined, &refine_task_id)
            .await?;
        let refined = self.download(job_id, Stage::Refined, refined_url).await?;

        Ok(ModelUrls { preview, refined })
    }

    /// Poll `task_id` until it succeeds, returning its GLB URL.
    ///
    /// Every poll writes the upstream status and the mapped progress to
    /// the job. Upstream failure statuses end the loop with an error.
    async fn poll_until_done(
        &self,
        job_id: &str,
        stage: Stage,
        task_id: &str,
    ) -> Result<String, WorkflowError> {
        self.enter(job_id, WorkflowPhase::polling(stage), task_id);
        let mut attempts: u32 = 0;

        loop {
            let snapshot = self
                .gateway
                .poll_status(task_id)
                .await
                .map_err(|source| WorkflowError::Gateway { stage, source })?;
            attempts += 1;

            if snapshot.status.is_failure() {
                return Err(WorkflowError::TaskFailed {
                    stage,
                    status: snapshot.status.as_str().to_string(),
                    message: snapshot
                        .error_message
                        .unwrap_or_else(|| "no reason given".to_string()),
                });
            }

            // A finished stage owns its whole slice, whatever fraction was reported.
            let progress = if snapshot.status.is_succeeded() {
                stage_progress(stage, 1.0)
            } else {
                stage_progress(stage, snapshot.progress)
            };
            let status = snapshot.status.as_str();
            self.store
                .update(job_id, |job| job.record_poll(status, progress, Utc::now()))
                .await?;

            tracing::debug!(
                job_id,
                task_id,
                %stage,
                status,
                progress,
                attempts,
                "Polled task",
            );

            if snapshot.status.is_succeeded() {
                return snapshot
                    .glb_url
                    .ok_or(WorkflowError::MissingAsset { stage });
            }

            if let Some(max) = self.max_poll_attempts {
                if attempts >= max {
                    return Err(WorkflowError::PollLimitExceeded { stage, attempts });
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Fetch a finished model and store it under its deterministic name.
    async fn download(
        &self,
        job_id: &str,
        stage: Stage,
        remote: String,
    ) -> Result<ModelFile, WorkflowError> {
        let bytes = self
            .gateway
            .fetch_asset(&remote)
            .await
            .map_err(|source| WorkflowError::Gateway { stage, source })?;

        let local = asset_filename(job_id, stage);
        let path = self
            .storage
            .write_new(&local, &bytes)
            .await
            .map_err(|source| WorkflowError::Storage { stage, source })?;

        tracing::info!(
            job_id,
            %stage,
            path = %path.display(),
            bytes = bytes.len(),
            phase = %WorkflowPhase::downloaded(stage),
            "Model saved",
        );

        let url = format!("{}/generated_models/{local}", self.public_base_url);
        Ok(ModelFile { remote, local, url })
    }

    fn enter(&self, job_id: &str, phase: WorkflowPhase, task_id: &str) {
        tracing::info!(job_id, task_id, %phase, "Workflow phase");
    }
}
