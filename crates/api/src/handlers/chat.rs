//! Handlers for the design-assistant chat and summary proxies.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use meshforge_chat::{ChatReply, IncomingMessage, SummaryReply};
use meshforge_core::error::CoreError;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::handlers::bad_json;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pull a non-empty list of messages out of `body[key]`.
///
/// `label` names the field in error messages ("Messages", "Conversation").
fn message_list(
    body: &Value,
    key: &str,
    label: &str,
    missing: &str,
) -> Result<Vec<IncomingMessage>, CoreError> {
    let raw = match body.get(key) {
        None | Some(Value::Null) => return Err(CoreError::Validation(missing.to_string())),
        Some(raw) => raw,
    };

    let items = raw
        .as_array()
        .ok_or_else(|| CoreError::Validation(format!("{label} must be a list")))?;

    if items.is_empty() {
        return Err(CoreError::Validation(format!("{label} must not be empty")));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            IncomingMessage::from_json(item).ok_or_else(|| {
                CoreError::Validation(format!("{label} entry {i} must be an object"))
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// POST /api/chat
// ---------------------------------------------------------------------------

/// Get the assistant's next reply for a conversation.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ChatReply>> {
    let Json(body) = body.map_err(bad_json)?;
    let messages = message_list(&body, "messages", "Messages", "Messages are required")?;

    tracing::info!(message_count = messages.len(), "Processing chat request");

    let reply = state
        .assistant
        .chat(&messages)
        .await
        .map_err(|e| AppError::Upstream(format!("Chat service error: {e}")))?;

    Ok(Json(reply))
}

// ---------------------------------------------------------------------------
// POST /api/generate-summary
// ---------------------------------------------------------------------------

/// Condense a design conversation into a short generation prompt.
pub async fn generate_summary(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<SummaryReply>> {
    let Json(body) = body.map_err(bad_json)?;
    let conversation = message_list(
        &body,
        "conversation",
        "Conversation",
        "Conversation history is required",
    )?;

    tracing::info!(
        message_count = conversation.len(),
        "Processing summary request"
    );

    let reply = state
        .assistant
        .summarize(&conversation)
        .await
        .map_err(|e| AppError::Upstream(format!("Summary generation error: {e}")))?;

    Ok(Json(reply))
}
