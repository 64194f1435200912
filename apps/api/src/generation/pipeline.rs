//! Tailor and refine: the two generation operations exposed to the boundary.
//!
//! Flow (generate): extract → compile(Tailor) → generate → normalize.
//! Flow (refine):   compile(Refine) → generate → normalize.
//!
//! Every dependency is passed in. Nothing is remembered between calls: refine
//! sees only the draft and the feedback it is given.

use tracing::{debug, info};

use crate::errors::AppError;
use crate::extract::Extractor;
use crate::generation::normalize::{normalize, TailoredMarkdown};
use crate::generation::prompts::compile;
use crate::llm_client::TextGenerator;
use crate::models::document::SourceDocument;
use crate::models::resume::GenerationContext;

/// Tailors the uploaded résumé to `job_description`.
/// Inputs are assumed non-empty; the handlers validate them.
pub async fn generate(
    extractor: &Extractor,
    generator: &dyn TextGenerator,
    document: &SourceDocument,
    job_description: &str,
) -> Result<TailoredMarkdown, AppError> {
    let resume_text = extractor.extract(document).await?;

    let context = GenerationContext::Tailor {
        resume_text: resume_text.into_inner(),
        job_description: job_description.to_string(),
    };
    run(generator, &context).await
}

/// Revises `current_draft` according to `feedback`.
pub async fn refine(
    generator: &dyn TextGenerator,
    current_draft: &str,
    feedback: &str,
) -> Result<TailoredMarkdown, AppError> {
    let context = GenerationContext::Refine {
        current_draft: current_draft.to_string(),
        feedback: feedback.to_string(),
    };
    run(generator, &context).await
}

async fn run(
    generator: &dyn TextGenerator,
    context: &GenerationContext,
) -> Result<TailoredMarkdown, AppError> {
    let prompt = compile(context);
    info!(
        "Running {} via {} ({} prompt chars)",
        context.kind(),
        generator.name(),
        prompt.as_str().len()
    );

    let raw = generator.generate(&prompt).await?;
    let markdown = normalize(&raw);

    debug!(
        "{} produced {} raw chars, {} after normalization",
        context.kind(),
        raw.as_str().len(),
        markdown.as_str().len()
    );
    Ok(markdown)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::extract::{DocumentFormat, ExtractError, ParseError};
    use crate::llm_client::mock::MockGenerator;
    use crate::llm_client::GenerationError;

    fn jane_pdf(_: &[u8]) -> Result<String, ParseError> {
        Ok("Jane Doe\nSoftware Engineer".to_string())
    }

    fn extractor() -> Extractor {
        Extractor::new().with_parser(DocumentFormat::Pdf, jane_pdf)
    }

    fn upload(filename: &str) -> SourceDocument {
        SourceDocument::new(
            &b"%PDF-1.4 fixture"[..],
            filename,
            Some("application/pdf".to_string()),
        )
    }

    #[tokio::test]
    async fn test_generate_sends_resume_and_job_description() {
        let mock = MockGenerator::replying("```markdown\n# Jane Doe\n## Experience\n```");
        let jd = "Looking for a backend engineer with Go experience";

        let markdown = generate(&extractor(), &mock, &upload("resume.pdf"), jd)
            .await
            .unwrap();

        assert_eq!(markdown.as_str(), "# Jane Doe\n## Experience");
        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Jane Doe\nSoftware Engineer"));
        assert!(prompts[0].contains(jd));
    }

    #[tokio::test]
    async fn test_refine_uses_only_draft_and_feedback() {
        let mock = MockGenerator::replying("# Jane Doe\n\n## Skills\n- Go");

        let first = generate(
            &extractor(),
            &mock,
            &upload("resume.pdf"),
            "Looking for a backend engineer with Go experience",
        )
        .await
        .unwrap();
        let refined = refine(&mock, "# Jane Doe", "Add a skills section")
            .await
            .unwrap();

        assert_eq!(first.as_str(), refined.as_str());
        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("# Jane Doe"));
        assert!(prompts[1].contains("Add a skills section"));
        assert!(!prompts[1].contains("backend engineer"));
        assert!(!prompts[1].contains("Software Engineer"));
    }

    #[tokio::test]
    async fn test_unsupported_upload_never_reaches_model() {
        let mock = MockGenerator::replying("# unused");
        let err = generate(&extractor(), &mock, &upload("resume.txt"), "Go")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Extract(ExtractError::UnsupportedFormat { .. })
        ));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_timeout_surfaces_typed() {
        let mock = MockGenerator::scripted(vec![Err(GenerationError::Timeout(
            Duration::from_secs(120),
        ))]);
        let err = refine(&mock, "# Jane Doe", "shorter").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Generation(GenerationError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_extraction_still_generates() {
        let extractor = Extractor::new().with_parser(DocumentFormat::Pdf, |_| Ok(String::new()));
        let mock = MockGenerator::replying("# Candidate");

        let markdown = generate(&extractor, &mock, &upload("scan.pdf"), "Go")
            .await
            .unwrap();
        assert_eq!(markdown.as_str(), "# Candidate");
        assert_eq!(mock.calls(), 1);
    }
}
