//! Handlers for prompt submission and job status polling.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use meshforge_core::job::{Job, JOB_STATUS_PROCESSING};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::bad_json;
use crate::state::AppState;

/// Message returned alongside a freshly dispatched job.
pub const GENERATION_STARTED_MESSAGE: &str = "Your 3D model generation has started";

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub job_id: String,
    pub status: &'static str,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// POST /api/generate
// ---------------------------------------------------------------------------

/// Start generating a model from a text prompt.
///
/// Responds immediately with the new job id; the work happens in the
/// background and is observed through `/api/status/{job_id}`.
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<Json<GenerateResponse>> {
    let Json(input) = body.map_err(bad_json)?;
    let prompt = input.prompt.unwrap_or_default();

    let job_id = state.dispatcher.dispatch(&prompt).await?;

    Ok(Json(GenerateResponse {
        job_id,
        status: JOB_STATUS_PROCESSING,
        message: GENERATION_STARTED_MESSAGE,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/status/{job_id}
// ---------------------------------------------------------------------------

/// Current record of a job.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<Job>> {
    let job = state.jobs.get(&job_id).await?;
    Ok(Json(job))
}
