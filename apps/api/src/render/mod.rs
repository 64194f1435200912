//! Artifact Renderer: normalized markdown in, downloadable file out.
//!
//! * markdown → the text unchanged
//! * pdf      → print HTML, headless Chromium, A4 with 40pt margins
//! * doc      → Word-namespaced HTML served as `application/msword`
//!
//! Render calls share no state beyond the PDF admission semaphore.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::generation::normalize::{normalize_text, TailoredMarkdown};

pub mod handlers;
pub mod html;
pub mod pdf;

/// Base name for every download.
const ARTIFACT_BASENAME: &str = "tailored-resume";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid format '{0}': expected one of markdown, pdf, doc")]
    InvalidFormat(String),

    #[error("Headless browser unavailable: {0}")]
    Engine(String),

    #[error("Page did not settle within {0:?}")]
    Timeout(Duration),

    #[error("PDF printing failed: {0}")]
    Print(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Pdf,
    Doc,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "text/markdown",
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Doc => "application/msword",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Doc => "doc",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(OutputFormat::Markdown),
            "pdf" => Ok(OutputFormat::Pdf),
            "doc" => Ok(OutputFormat::Doc),
            other => Err(RenderError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Doc => "doc",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactBody {
    Text(String),
    Binary(Vec<u8>),
}

/// A rendered file plus the metadata needed to serve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub format: OutputFormat,
    pub body: ArtifactBody,
}

impl RenderedArtifact {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// Suggested download name, e.g. `tailored-resume.pdf`.
    pub fn filename(&self) -> String {
        format!("{ARTIFACT_BASENAME}.{}", self.extension())
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.body {
            ArtifactBody::Text(text) => text.as_bytes(),
            ArtifactBody::Binary(bytes) => bytes,
        }
    }
}

impl IntoResponse for RenderedArtifact {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename={}", self.filename());
        let headers = [
            (header::CONTENT_TYPE, self.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ];
        match self.body {
            ArtifactBody::Text(text) => (headers, text).into_response(),
            ArtifactBody::Binary(bytes) => (headers, bytes).into_response(),
        }
    }
}

/// Turns a complete HTML page into PDF bytes.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn print(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Stateless renderer. PDF renders are admission-limited because each one
/// starts its own browser.
#[derive(Clone)]
pub struct Renderer {
    pdf_engine: Arc<dyn PdfEngine>,
    pdf_permits: Arc<Semaphore>,
}

impl Renderer {
    pub fn new(pdf_engine: Arc<dyn PdfEngine>, max_concurrent_pdf: usize) -> Self {
        Self {
            pdf_engine,
            pdf_permits: Arc::new(Semaphore::new(max_concurrent_pdf.max(1))),
        }
    }

    pub async fn render(
        &self,
        markdown: &TailoredMarkdown,
        format: OutputFormat,
    ) -> Result<RenderedArtifact, RenderError> {
        let body = match format {
            OutputFormat::Markdown => ArtifactBody::Text(markdown.as_str().to_string()),
            OutputFormat::Doc => {
                let page = html::word_document(&html::markdown_to_html(markdown.as_str()));
                ArtifactBody::Binary(page.into_bytes())
            }
            OutputFormat::Pdf => {
                let page = html::print_document(&html::markdown_to_html(markdown.as_str()));
                let _permit = self
                    .pdf_permits
                    .acquire()
                    .await
                    .map_err(|_| RenderError::Engine("render queue closed".to_string()))?;
                debug!(
                    "PDF render admitted ({} slots free)",
                    self.pdf_permits.available_permits()
                );
                ArtifactBody::Binary(self.pdf_engine.print(&page).await?)
            }
        };

        let artifact = RenderedArtifact { format, body };
        info!(
            "Rendered {} ({} bytes)",
            artifact.filename(),
            artifact.as_bytes().len()
        );
        Ok(artifact)
    }
}

/// Boundary operation: validates the format, normalizes the client's
/// markdown, renders it.
pub async fn download(
    renderer: &Renderer,
    markdown: &str,
    format: &str,
) -> Result<RenderedArtifact, RenderError> {
    let format: OutputFormat = format.parse()?;
    let markdown = normalize_text(markdown);
    renderer.render(&markdown, format).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Records the pages it is given and how many ran at once.
    #[derive(Default)]
    struct FakePdfEngine {
        pages: Mutex<Vec<String>>,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PdfEngine for FakePdfEngine {
        async fn print(&self, html: &str) -> Result<Vec<u8>, RenderError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.pages.lock().unwrap().push(html.to_string());
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(b"%PDF-1.7 fake".to_vec())
        }
    }

    struct BrokenPdfEngine;

    #[async_trait]
    impl PdfEngine for BrokenPdfEngine {
        async fn print(&self, _html: &str) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Engine("chrome not found".to_string()))
        }
    }

    fn renderer_with(engine: Arc<dyn PdfEngine>) -> Renderer {
        Renderer::new(engine, 2)
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("pdf".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("doc".parse::<OutputFormat>().unwrap(), OutputFormat::Doc);
        assert!(matches!(
            "xlsx".parse::<OutputFormat>(),
            Err(RenderError::InvalidFormat(ref f)) if f == "xlsx"
        ));
        assert!("PDF".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_artifact_metadata() {
        let artifact = RenderedArtifact {
            format: OutputFormat::Doc,
            body: ArtifactBody::Binary(vec![]),
        };
        assert_eq!(artifact.content_type(), "application/msword");
        assert_eq!(artifact.filename(), "tailored-resume.doc");
    }

    #[tokio::test]
    async fn test_markdown_download_is_passthrough() {
        let renderer = renderer_with(Arc::new(BrokenPdfEngine));
        let artifact = download(&renderer, "# Title", "markdown").await.unwrap();

        assert_eq!(artifact.body, ArtifactBody::Text("# Title".to_string()));
        assert_eq!(artifact.content_type(), "text/markdown");
        assert_eq!(artifact.filename(), "tailored-resume.md");
    }

    #[tokio::test]
    async fn test_unknown_format_rejected_before_rendering() {
        let engine = Arc::new(FakePdfEngine::default());
        let renderer = renderer_with(engine.clone());

        let err = download(&renderer, "# Title", "xlsx").await.unwrap_err();
        assert!(matches!(err, RenderError::InvalidFormat(_)));
        assert!(engine.pages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_doc_is_word_html() {
        let renderer = renderer_with(Arc::new(BrokenPdfEngine));
        let artifact = download(&renderer, "# Jane Doe\n\n- Go", "doc").await.unwrap();

        let text = String::from_utf8(artifact.as_bytes().to_vec()).unwrap();
        assert!(text.contains("urn:schemas-microsoft-com:office:word"));
        assert!(text.contains("<h1>Jane Doe</h1>"));
        assert_eq!(artifact.extension(), "doc");
    }

    #[tokio::test]
    async fn test_pdf_prints_styled_page() {
        let engine = Arc::new(FakePdfEngine::default());
        let renderer = renderer_with(engine.clone());

        let artifact = download(&renderer, "# Jane Doe", "pdf").await.unwrap();
        assert_eq!(artifact.content_type(), "application/pdf");
        assert_eq!(artifact.as_bytes(), b"%PDF-1.7 fake");

        let pages = engine.pages.lock().unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("<h1>Jane Doe</h1>"));
        assert!(pages[0].contains("size: A4"));
    }

    #[tokio::test]
    async fn test_fenced_client_markdown_is_normalized_first() {
        let renderer = renderer_with(Arc::new(BrokenPdfEngine));
        let artifact = download(&renderer, "```markdown\n# Jane\n```", "markdown")
            .await
            .unwrap();
        assert_eq!(artifact.as_bytes(), b"# Jane");
    }

    #[tokio::test]
    async fn test_rendering_twice_is_stable() {
        let renderer = renderer_with(Arc::new(FakePdfEngine::default()));
        for format in ["markdown", "doc", "pdf"] {
            let a = download(&renderer, "# Jane\n\n## Skills", format).await.unwrap();
            let b = download(&renderer, "# Jane\n\n## Skills", format).await.unwrap();
            assert_eq!(a.content_type(), b.content_type());
            assert_eq!(a.extension(), b.extension());
            if format != "pdf" {
                assert_eq!(a.as_bytes(), b.as_bytes());
            }
        }
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces() {
        let renderer = renderer_with(Arc::new(BrokenPdfEngine));
        let err = download(&renderer, "# Jane", "pdf").await.unwrap_err();
        assert!(matches!(err, RenderError::Engine(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_pdf_renders_are_limited() {
        let engine = Arc::new(FakePdfEngine::default());
        let renderer = renderer_with(engine.clone());

        let renders = (0..5).map(|_| download(&renderer, "# Jane", "pdf"));
        let results = futures::future::join_all(renders).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(engine.pages.lock().unwrap().len(), 5);
        assert!(engine.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_artifact_response_headers() {
        let artifact = RenderedArtifact {
            format: OutputFormat::Pdf,
            body: ArtifactBody::Binary(b"%PDF".to_vec()),
        };
        let response = artifact.into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=tailored-resume.pdf"
        );
    }
}
