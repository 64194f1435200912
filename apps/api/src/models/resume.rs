use serde::Deserialize;

/// Everything one tailor or refine call needs. Nothing carries over between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationContext {
    Tailor {
        resume_text: String,
        job_description: String,
    },
    Refine {
        current_draft: String,
        feedback: String,
    },
}

impl GenerationContext {
    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationContext::Tailor { .. } => "tailor",
            GenerationContext::Refine { .. } => "refine",
        }
    }
}

/// Request body for POST /api/refine-resume.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    #[serde(default)]
    pub original_resume: String,
    #[serde(default)]
    pub feedback: String,
}

/// Request body for POST /api/download-resume.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub format: String,
}
