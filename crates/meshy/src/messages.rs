//! Wire types for the Meshy text-to-3D endpoints.
//!
//! ```text
//! POST /text-to-3d             {mode: "preview", prompt, ...} -> {result: task_id}
//! POST /text-to-3d             {mode: "refine", preview_task_id} -> {result: task_id}
//! GET  /text-to-3d/{task_id}   -> {id, status, progress, model_urls, task_error}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fixed preview parameters
// ---------------------------------------------------------------------------

/// Negative prompt applied to every preview.
pub const PREVIEW_NEGATIVE_PROMPT: &str = "low quality, low resolution, low poly, ugly";

/// Art style requested for every preview.
pub const PREVIEW_ART_STYLE: &str = "realistic";

/// Whether the service should remesh the preview output.
pub const PREVIEW_SHOULD_REMESH: bool = true;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /text-to-3d`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TextTo3dRequest {
    Preview {
        prompt: String,
        negative_prompt: String,
        art_style: String,
        should_remesh: bool,
    },
    Refine {
        preview_task_id: String,
    },
}

impl TextTo3dRequest {
    /// Preview request carrying the fixed quality parameters.
    pub fn preview(prompt: &str) -> Self {
        TextTo3dRequest::Preview {
            prompt: prompt.to_string(),
            negative_prompt: PREVIEW_NEGATIVE_PROMPT.to_string(),
            art_style: PREVIEW_ART_STYLE.to_string(),
            should_remesh: PREVIEW_SHOULD_REMESH,
        }
    }

    pub fn refine(preview_task_id: &str) -> Self {
        TextTo3dRequest::Refine {
            preview_task_id: preview_task_id.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response of `POST /text-to-3d`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// New task id. Absent on malformed responses.
    #[serde(default)]
    pub result: Option<String>,
}

/// Response of `GET /text-to-3d/{task_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub status: TaskStatus,
    /// Percent complete, 0..=100.
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub model_urls: Option<TaskModelUrls>,
    #[serde(default)]
    pub task_error: Option<TaskError>,
}

/// Download URLs of a finished task, one per format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskModelUrls {
    #[serde(default)]
    pub glb: Option<String>,
    #[serde(default)]
    pub fbx: Option<String>,
    #[serde(default)]
    pub usdz: Option<String>,
    #[serde(default)]
    pub obj: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskError {
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Task status
// ---------------------------------------------------------------------------

/// Status of an upstream task, kept verbatim for anything unrecognised.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
    Canceled,
    Expired,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Succeeded => "SUCCEEDED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Canceled => "CANCELED",
            TaskStatus::Expired => "EXPIRED",
            TaskStatus::Other(status) => status,
        }
    }

    /// The task finished and its assets can be downloaded.
    pub fn is_succeeded(&self) -> bool {
        matches!(self, TaskStatus::Succeeded) || self.other_is("SUCCEEDED")
    }

    /// The task reached a terminal state without producing assets.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TaskStatus::Failed | TaskStatus::Canceled | TaskStatus::Expired
        ) || FAILURE_LABELS.iter().any(|label| self.other_is(label))
    }

    /// An unrecognised spelling of `label` (different case, British spelling).
    fn other_is(&self, label: &str) -> bool {
        matches!(self, TaskStatus::Other(status) if status.eq_ignore_ascii_case(label))
    }
}

/// Terminal failure labels, matched case-insensitively on unknown spellings.
const FAILURE_LABELS: [&str; 4] = ["FAILED", "CANCELED", "CANCELLED", "EXPIRED"];

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => TaskStatus::Pending,
            "IN_PROGRESS" => TaskStatus::InProgress,
            "SUCCEEDED" => TaskStatus::Succeeded,
            "FAILED" => TaskStatus::Failed,
            "CANCELED" => TaskStatus::Canceled,
            "EXPIRED" => TaskStatus::Expired,
            _ => TaskStatus::Other(value),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_request_carries_fixed_parameters() {
        let json = serde_json::to_value(TextTo3dRequest::preview("a red sneaker")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "mode": "preview",
                "prompt": "a red sneaker",
                "negative_prompt": "low quality, low resolution, low poly, ugly",
                "art_style": "realistic",
                "should_remesh": true,
            })
        );
    }

    #[test]
    fn refine_request_references_preview_task() {
        let json = serde_json::to_value(TextTo3dRequest::refine("task-1")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "mode": "refine", "preview_task_id": "task-1" })
        );
    }

    #[test]
    fn task_response_parses_succeeded_task() {
        let task: TaskResponse = serde_json::from_value(serde_json::json!({
            "id": "task-1",
            "status": "SUCCEEDED",
            "progress": 100,
            "model_urls": { "glb": "https://assets.example.com/m.glb", "fbx": "x" },
        }))
        .unwrap();

        assert!(task.status.is_succeeded());
        assert_eq!(task.progress, Some(100.0));
        assert_eq!(
            task.model_urls.unwrap().glb.as_deref(),
            Some("https://assets.example.com/m.glb")
        );
    }

    #[test]
    fn task_response_tolerates_missing_optional_fields() {
        let task: TaskResponse =
            serde_json::from_value(serde_json::json!({ "status": "PENDING" })).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.progress.is_none());
        assert!(task.model_urls.is_none());
    }

    #[test]
    fn failure_statuses_are_detected() {
        assert!(TaskStatus::from("FAILED".to_string()).is_failure());
        assert!(TaskStatus::from("CANCELLED".to_string()).is_failure());
        assert!(TaskStatus::from("EXPIRED".to_string()).is_failure());
        assert!(!TaskStatus::from("IN_PROGRESS".to_string()).is_failure());
    }

    #[test]
    fn other_spellings_keep_their_text() {
        let cancelled = TaskStatus::from("CANCELLED".to_string());
        assert_eq!(cancelled.as_str(), "CANCELLED");
        assert!(cancelled.is_failure());

        let lower = TaskStatus::from("in_progress".to_string());
        assert_eq!(lower.as_str(), "in_progress");
        assert!(!lower.is_failure());
        assert!(!lower.is_succeeded());

        let succeeded = TaskStatus::from("succeeded".to_string());
        assert_eq!(succeeded.as_str(), "succeeded");
        assert!(succeeded.is_succeeded());
    }

    #[test]
    fn unknown_status_kept_verbatim() {
        let status = TaskStatus::from("WARMING_UP".to_string());
        assert_eq!(status, TaskStatus::Other("WARMING_UP".into()));
        assert_eq!(status.as_str(), "WARMING_UP");
        assert!(!status.is_failure());
        assert!(!status.is_succeeded());
    }
}
