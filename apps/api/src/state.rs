use std::sync::Arc;

use crate::config::Config;
use crate::extract::Extractor;
use crate::llm_client::TextGenerator;
use crate::render::Renderer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds only immutable collaborators; no request data is kept between calls.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub extractor: Arc<Extractor>,
    /// Pluggable text generator. Selected by LLM_PROVIDER, optionally wrapped for retry.
    pub generator: Arc<dyn TextGenerator>,
    pub renderer: Arc<Renderer>,
}
