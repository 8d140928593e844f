//! Serving of downloaded model files.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use meshforge_core::naming::content_type_for;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Cache directives attached to every served model.
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

// ---------------------------------------------------------------------------
// GET /generated_models/{filename}
// ---------------------------------------------------------------------------

/// Serve a stored model by filename, with caching disabled.
pub async fn serve_model(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    tracing::debug!(filename = %filename, "Model file requested");

    let data = state.storage.read(&filename).await?;

    tracing::info!(filename = %filename, bytes = data.len(), "Serving model file");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&filename))
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .header(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE))
        .header(header::PRAGMA, HeaderValue::from_static("no-cache"))
        .header(header::EXPIRES, HeaderValue::from_static("0"))
        .header(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::InternalError(e.to_string()))
}
