//! The generation job record and its transition rules.
//!
//! A [`Job`] is created as `PROCESSING` at progress 0, follows the
//! upstream task status verbatim while the workflow polls, and ends in
//! exactly one of `COMPLETED` (with model URLs) or `FAILED` (with an error
//! message). Terminal jobs reject every further mutation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::naming::Stage;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Status label of a freshly dispatched job.
pub const JOB_STATUS_PROCESSING: &str = "PROCESSING";
/// Status label once both stage assets are stored locally.
pub const JOB_STATUS_COMPLETED: &str = "COMPLETED";
/// Status label once the workflow has given up.
pub const JOB_STATUS_FAILED: &str = "FAILED";

/// Job status as exposed to clients.
///
/// Serialized as a bare string. While a stage is being polled the job
/// carries the upstream task status unchanged (`PENDING`, `IN_PROGRESS`,
/// `SUCCEEDED`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Processing,
    Upstream(String),
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Processing => JOB_STATUS_PROCESSING,
            JobStatus::Upstream(status) => status,
            JobStatus::Completed => JOB_STATUS_COMPLETED,
            JobStatus::Failed => JOB_STATUS_FAILED,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            JOB_STATUS_PROCESSING => JobStatus::Processing,
            JOB_STATUS_COMPLETED => JobStatus::Completed,
            JOB_STATUS_FAILED => JobStatus::Failed,
            _ => JobStatus::Upstream(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        match value {
            JobStatus::Upstream(status) => status,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress of a job that has not been polled yet.
pub const PROGRESS_START: u8 = 0;
/// Progress at which the preview stage ends and the refine stage begins.
pub const PROGRESS_PREVIEW_DONE: u8 = 50;
/// Progress of a completed job.
pub const PROGRESS_COMPLETE: u8 = 100;

/// Map an upstream progress fraction onto the stage's slice of 0..=100.
///
/// Preview covers 0..=50 and refine covers 50..=100. Out-of-range and
/// non-finite fractions are clamped.
pub fn stage_progress(stage: Stage, fraction: f64) -> u8 {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let span = f64::from(PROGRESS_PREVIEW_DONE - PROGRESS_START);
    let offset = (fraction * span).round() as u8;

    match stage {
        Stage::Preview => PROGRESS_START + offset,
        Stage::Refined => PROGRESS_PREVIEW_DONE + offset,
    }
}

// ---------------------------------------------------------------------------
// Model URLs
// ---------------------------------------------------------------------------

/// Where one stage's model can be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFile {
    /// URL the generation service reported for the asset.
    pub remote: String,
    /// Filename under the local asset root.
    pub local: String,
    /// URL a browser client can fetch the stored copy from.
    pub url: String,
}

/// Model locations for both stages of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUrls {
    pub preview: ModelFile,
    pub refined: ModelFile,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One prompt-to-model request, from dispatch to terminal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub status: JobStatus,
    /// Overall progress in 0..=100. Never decreases.
    pub progress: u8,
    pub prompt: String,
    /// Set exactly when `status` is `COMPLETED`.
    pub model_urls: Option<ModelUrls>,
    /// Set exactly when `status` is `FAILED`.
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    /// A new `PROCESSING` job at progress 0.
    pub fn new(prompt: impl Into<String>, now: Timestamp) -> Self {
        Self {
            status: JobStatus::Processing,
            progress: PROGRESS_START,
            prompt: prompt.into(),
            model_urls: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record the outcome of one poll of an upstream task.
    ///
    /// The upstream status is stored verbatim. Progress only moves forward;
    /// a smaller value than the current one is ignored.
    pub fn record_poll(
        &mut self,
        upstream_status: &str,
        progress: u8,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        self.ensure_not_terminal()?;

        if matches!(
            upstream_status,
            JOB_STATUS_COMPLETED | JOB_STATUS_FAILED
        ) {
            return Err(CoreError::Validation(format!(
                "Upstream status '{upstream_status}' collides with a terminal job status"
            )));
        }

        self.status = JobStatus::Upstream(upstream_status.to_string());
        self.progress = self.progress.max(progress.min(PROGRESS_COMPLETE));
        self.updated_at = now;
        Ok(())
    }

    /// Move to `COMPLETED` with both stage models in place.
    pub fn complete(&mut self, model_urls: ModelUrls, now: Timestamp) -> Result<(), CoreError> {
        self.ensure_not_terminal()?;

        self.status = JobStatus::Completed;
        self.progress = PROGRESS_COMPLETE;
        self.model_urls = Some(model_urls);
        self.error = None;
        self.updated_at = now;
        Ok(())
    }

    /// Move to `FAILED`, recording a human-readable reason.
    pub fn fail(&mut self, message: impl Into<String>, now: Timestamp) -> Result<(), CoreError> {
        self.ensure_not_terminal()?;

        let message = message.into();
        self.status = JobStatus::Failed;
        self.model_urls = None;
        self.error = Some(if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        });
        self.updated_at = now;
        Ok(())
    }

    fn ensure_not_terminal(&self) -> Result<(), CoreError> {
        if self.is_terminal() {
            return Err(CoreError::Conflict(format!(
                "Job is already {}",
                self.status
            )));
        }
        Ok(())
    }
}
