//! Axum route handlers for the Generation API.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    Json,
};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::ExtractError;
use crate::generation::pipeline;
use crate::models::document::SourceDocument;
use crate::models::resume::RefineRequest;
use crate::state::AppState;

/// Declared upload types accepted before extraction is attempted.
const ALLOWED_UPLOAD_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub resume: String,
}

/// Fields pulled out of the generate-resume multipart body.
#[derive(Default)]
struct GenerateForm {
    resume: Option<SourceDocument>,
    job_description: Option<String>,
}

async fn read_generate_form(mut multipart: Multipart) -> Result<GenerateForm, AppError> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("resume") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                form.resume = Some(SourceDocument::new(bytes, filename, content_type));
            }
            Some("jobDescription") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid job description: {e}")))?;
                form.job_description = Some(text);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Upload filter: the declared MIME type must be one of the accepted formats.
fn check_upload_type(document: &SourceDocument) -> Result<(), AppError> {
    let declared = document.content_type.as_deref().unwrap_or_default();
    if ALLOWED_UPLOAD_TYPES.contains(&declared) {
        return Ok(());
    }
    warn!(
        "Rejected upload '{}' with declared type '{declared}'",
        document.filename
    );
    Err(ExtractError::UnsupportedFormat {
        filename: document.filename.clone(),
    }
    .into())
}

/// POST /api/generate-resume
///
/// Multipart upload: `resume` (PDF/DOC/DOCX file) and `jobDescription` (text).
/// Returns the tailored résumé as markdown.
pub async fn handle_generate(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResumeResponse>, AppError> {
    let form = read_generate_form(multipart?).await?;

    let (document, job_description) = match (form.resume, form.job_description) {
        (Some(document), Some(jd)) if !document.bytes.is_empty() && !jd.trim().is_empty() => {
            (document, jd)
        }
        _ => {
            return Err(AppError::Validation(
                "Missing resume file or job description".to_string(),
            ))
        }
    };
    check_upload_type(&document)?;

    let span = info_span!("generate", request_id = %Uuid::new_v4());
    async move {
        info!(
            "Tailoring '{}' ({} bytes) against a {} char job description",
            document.filename,
            document.bytes.len(),
            job_description.len()
        );
        let markdown = pipeline::generate(
            &state.extractor,
            state.generator.as_ref(),
            &document,
            &job_description,
        )
        .await?;

        Ok::<_, AppError>(Json(ResumeResponse {
            resume: markdown.into_inner(),
        }))
    }
    .instrument(span)
    .await
}

/// POST /api/refine-resume
///
/// Revises a previously generated résumé according to free-text feedback.
/// Only the draft and feedback in this request are sent to the model.
pub async fn handle_refine(
    State(state): State<AppState>,
    payload: Result<Json<RefineRequest>, JsonRejection>,
) -> Result<Json<ResumeResponse>, AppError> {
    let Json(request) = payload?;
    if request.original_resume.trim().is_empty() || request.feedback.trim().is_empty() {
        return Err(AppError::Validation(
            "Missing resume or feedback".to_string(),
        ));
    }

    let span = info_span!("refine", request_id = %Uuid::new_v4());
    async move {
        info!(
            "Refining a {} char draft with {} chars of feedback",
            request.original_resume.len(),
            request.feedback.len()
        );
        let markdown = pipeline::refine(
            state.generator.as_ref(),
            &request.original_resume,
            &request.feedback,
        )
        .await?;

        Ok::<_, AppError>(Json(ResumeResponse {
            resume: markdown.into_inner(),
        }))
    }
    .instrument(span)
    .await
}
