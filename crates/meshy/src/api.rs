//! HTTP client for the Meshy text-to-3D REST API.
//!
//! Wraps the task endpoints (`POST /text-to-3d`, `GET /text-to-3d/{id}`)
//! and plain asset downloads using [`reqwest`].

use async_trait::async_trait;

use crate::config::MeshyConfig;
use crate::gateway::{GenerationGateway, TaskSnapshot};
use crate::messages::{SubmitResponse, TaskResponse, TextTo3dRequest};

/// Longest upstream body kept inside an error, in characters.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Thin HTTP wrapper around the Meshy task API.
pub struct MeshyApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

/// Errors from the Meshy REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum MeshyApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Meshy returned a non-2xx status code.
    #[error("Meshy API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Start of the response body, for diagnostics.
        body: String,
    },

    /// A 2xx response whose body lacked a required field.
    #[error("Malformed Meshy response: {0}")]
    MalformedResponse(String),
}

impl MeshyApi {
    /// Create a client from loaded configuration.
    pub fn new(config: &MeshyConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &MeshyConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Base URL this client talks to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Send a task creation request and return the new task id.
    async fn submit(&self, request: &TextTo3dRequest) -> Result<String, MeshyApiError> {
        let response = self
            .client
            .post(format!("{}/text-to-3d", self.api_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        submitted
            .result
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| MeshyApiError::MalformedResponse("missing task id in 'result'".into()))
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`MeshyApiError::ApiError`]
    /// containing the status and a body snippet on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MeshyApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MeshyApiError::ApiError {
                status: status.as_u16(),
                body: body_snippet(body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MeshyApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| MeshyApiError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl GenerationGateway for MeshyApi {
    async fn submit_preview(&self, prompt: &str) -> Result<String, MeshyApiError> {
        let task_id = self.submit(&TextTo3dRequest::preview(prompt)).await?;
        tracing::debug!(task_id = %task_id, "Preview task submitted");
        Ok(task_id)
    }

    async fn submit_refine(&self, preview_task_id: &str) -> Result<String, MeshyApiError> {
        let task_id = self
            .submit(&TextTo3dRequest::refine(preview_task_id))
            .await?;
        tracing::debug!(task_id = %task_id, preview_task_id, "Refine task submitted");
        Ok(task_id)
    }

    async fn poll_status(&self, task_id: &str) -> Result<TaskSnapshot, MeshyApiError> {
        let response = self
            .client
            .get(format!("{}/text-to-3d/{}", self.api_url, task_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let task: TaskResponse = Self::parse_response(response).await?;
        Ok(TaskSnapshot::from(task))
    }

    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, MeshyApiError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Cap an upstream body at [`MAX_ERROR_BODY_CHARS`] characters.
fn body_snippet(body: String) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body,
    }
}
