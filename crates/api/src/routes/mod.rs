pub mod health;
pub mod models;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{chat, generation};
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /generate                 start a generation job (POST)
/// /status/{job_id}          job record (GET)
/// /chat                     design-assistant reply (POST)
/// /generate-summary         conversation summary (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generation::generate))
        .route("/status/{job_id}", get(generation::job_status))
        .route("/chat", post(chat::chat))
        .route("/generate-summary", post(chat::generate_summary))
}
