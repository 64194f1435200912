use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::llm_client::GenerationError;
use crate::render::RenderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Each pipeline stage keeps its own typed error; nothing is flattened here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status and machine-readable code for this failure.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Extract(ExtractError::UnsupportedFormat { .. }) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
            }
            AppError::Extract(ExtractError::Extraction { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_ERROR")
            }
            AppError::Generation(e) => match e {
                GenerationError::Unavailable(_) | GenerationError::RetriesExhausted { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE")
                }
                GenerationError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "MODEL_TIMEOUT"),
                GenerationError::Rejected { .. }
                | GenerationError::MalformedResponse(_)
                | GenerationError::EmptyResponse => (StatusCode::BAD_GATEWAY, "MODEL_ERROR"),
            },
            AppError::Render(RenderError::InvalidFormat(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_FORMAT")
            }
            AppError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// Malformed request bodies are validation failures with the usual error body.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                match e {
                    GenerationError::Timeout(_) => "The AI service took too long to respond",
                    GenerationError::Unavailable(_) | GenerationError::RetriesExhausted { .. } => {
                        "The AI service is currently unavailable"
                    }
                    _ => "An AI processing error occurred",
                }
                .to_string()
            }
            AppError::Render(e @ RenderError::InvalidFormat(_)) => e.to_string(),
            AppError::Render(e) => {
                tracing::error!("Render error: {e}");
                "Failed to render the document".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::Validation(msg) => msg.clone(),
            AppError::Extract(e) => {
                tracing::warn!("Extraction failed: {e}");
                e.to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
