//! Axum route handler for the Download API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::RenderRequest;
use crate::render::{download, RenderedArtifact};
use crate::state::AppState;

/// POST /api/download-resume
///
/// Renders client-held markdown as markdown, PDF or DOC and returns it as an
/// attachment.
pub async fn handle_download(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<RenderedArtifact, AppError> {
    let Json(request) = payload?;
    if request.markdown.trim().is_empty() || request.format.trim().is_empty() {
        return Err(AppError::Validation(
            "Missing markdown content or format".to_string(),
        ));
    }

    let span = info_span!("download", request_id = %Uuid::new_v4(), format = %request.format);
    async move {
        info!("Download requested ({} markdown chars)", request.markdown.len());
        let artifact = download(&state.renderer, &request.markdown, &request.format).await?;
        Ok::<_, AppError>(artifact)
    }
    .instrument(span)
    .await
}
