mod config;
mod errors;
mod extract;
mod generation;
mod llm_client;
mod models;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::extract::Extractor;
use crate::llm_client::build_generator;
use crate::render::{pdf::ChromiumPdfEngine, Renderer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing provider API key)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize text extractor (PDF, DOCX, DOC)
    let extractor = Arc::new(Extractor::default());

    // Initialize text generator
    let generator = build_generator(&config)?;
    info!(
        "Text generator initialized ({}, model: {})",
        generator.name(),
        config.llm_model
    );

    // Initialize renderer; Chromium is launched per PDF render
    let pdf_engine = Arc::new(ChromiumPdfEngine::new(
        config.chrome_executable.clone(),
        config.render_timeout,
    ));
    let renderer = Arc::new(Renderer::new(pdf_engine, config.max_concurrent_renders));
    info!(
        "Renderer initialized ({} concurrent PDF renders, {:?} timeout)",
        config.max_concurrent_renders, config.render_timeout
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        extractor,
        generator,
        renderer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
