pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::narrative::handlers::handle_preview_segments;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Results API
        .route("/api/v1/results/generate", post(handlers::handle_generate))
        .route(
            "/api/v1/results/:attempt_id/regenerate",
            post(handlers::handle_regenerate),
        )
        .route("/api/v1/results/:attempt_id", get(handlers::handle_get_latest))
        .route(
            "/api/v1/results/:attempt_id/document",
            get(handlers::handle_download),
        )
        // Template authoring
        .route(
            "/api/v1/narrative/segments",
            post(handle_preview_segments),
        )
        .with_state(state)
}
