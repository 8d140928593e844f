//! The seam between the job workflow and the generation service.

use async_trait::async_trait;

use crate::api::MeshyApiError;
use crate::messages::{TaskResponse, TaskStatus};

/// Point-in-time view of an upstream task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    /// Completion as a fraction in 0.0..=1.0.
    pub progress: f64,
    /// GLB download URL, present once the task has succeeded.
    pub glb_url: Option<String>,
    /// Failure reason reported by the service, if any.
    pub error_message: Option<String>,
}

impl From<TaskResponse> for TaskSnapshot {
    fn from(task: TaskResponse) -> Self {
        let progress = task
            .progress
            .filter(|p| p.is_finite())
            .map(|p| (p / 100.0).clamp(0.0, 1.0))
            .unwrap_or(0.0);

        Self {
            status: task.status,
            progress,
            glb_url: task
                .model_urls
                .and_then(|urls| urls.glb)
                .filter(|url| !url.is_empty()),
            error_message: task
                .task_error
                .and_then(|err| err.message)
                .filter(|msg| !msg.trim().is_empty()),
        }
    }
}

/// Operations the job workflow needs from the text-to-3D service.
///
/// Each call is a single request/response with no local state; the caller
/// owns polling cadence and retries.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Start a preview task for `prompt`, returning the task id.
    async fn submit_preview(&self, prompt: &str) -> Result<String, MeshyApiError>;

    /// Start a refine task from a succeeded preview task.
    async fn submit_refine(&self, preview_task_id: &str) -> Result<String, MeshyApiError>;

    /// Check a task once.
    async fn poll_status(&self, task_id: &str) -> Result<TaskSnapshot, MeshyApiError>;

    /// Download the bytes behind an asset URL.
    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, MeshyApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(json: serde_json::Value) -> TaskResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn snapshot_normalizes_percent_to_fraction() {
        let snap = TaskSnapshot::from(task(serde_json::json!({
            "status": "IN_PROGRESS",
            "progress": 40,
        })));
        assert_eq!(snap.progress, 0.4);
        assert_eq!(snap.status, TaskStatus::InProgress);
    }

    #[test]
    fn snapshot_clamps_and_defaults_progress() {
        let over = TaskSnapshot::from(task(serde_json::json!({
            "status": "SUCCEEDED",
            "progress": 250,
        })));
        assert_eq!(over.progress, 1.0);

        let missing = TaskSnapshot::from(task(serde_json::json!({ "status": "PENDING" })));
        assert_eq!(missing.progress, 0.0);
    }

    #[test]
    fn snapshot_extracts_glb_and_error() {
        let snap = TaskSnapshot::from(task(serde_json::json!({
            "status": "FAILED",
            "model_urls": { "glb": "" },
            "task_error": { "message": "content policy" },
        })));
        assert!(snap.glb_url.is_none());
        assert_eq!(snap.error_message.as_deref(), Some("content policy"));
    }
}
