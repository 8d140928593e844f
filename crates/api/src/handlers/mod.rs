pub mod chat;
pub mod generation;
pub mod health;
pub mod models;

use axum::extract::rejection::JsonRejection;

use crate::error::AppError;

/// Turn a JSON extractor rejection into the standard JSON 400 body.
pub(crate) fn bad_json(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}
