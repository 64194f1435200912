use bytes::Bytes;

/// An uploaded résumé file as received at the boundary. Never persisted.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub bytes: Bytes,
    pub filename: String,
    /// Declared by the client. Untrusted: only the upload filter looks at it.
    pub content_type: Option<String>,
}

impl SourceDocument {
    pub fn new(
        bytes: impl Into<Bytes>,
        filename: impl Into<String>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
            content_type,
        }
    }
}

/// Plain text pulled out of a `SourceDocument`, in source paragraph/page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// True for image-only PDFs and empty documents.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}
