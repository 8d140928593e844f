//! Static-style serving of generated models.
//!
//! ```text
//! GET /generated_models/{filename}   -> serve_model
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::models;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/generated_models/{filename}", get(models::serve_model))
}
