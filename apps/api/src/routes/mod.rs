pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::render::handlers as render_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Generation API
        .route("/api/generate-resume", post(handlers::handle_generate))
        .route("/api/refine-resume", post(handlers::handle_refine))
        // Download API
        .route(
            "/api/download-resume",
            post(render_handlers::handle_download),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
