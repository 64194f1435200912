//! Text Extractor: turns an uploaded résumé file into plain text.
//!
//! Dispatch is by filename suffix only. The declared MIME type is checked by the
//! upload filter and never consulted here.
//!
//! Each supported format maps to a pure `ParseFn` in a capability table. Parsers
//! run on the blocking pool; a panic inside a parser is reported as an
//! extraction failure for that document.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::document::{ExtractedText, SourceDocument};

pub mod docx;
pub mod pdf;

/// A document format the extractor knows how to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
}

impl DocumentFormat {
    /// Resolves the format from a filename suffix (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "doc" => Some(DocumentFormat::Doc),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Doc => "DOC",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file format for '{filename}': only .pdf, .doc and .docx are accepted")]
    UnsupportedFormat { filename: String },

    #[error("Failed to extract text from {format} document: {reason}")]
    Extraction {
        format: DocumentFormat,
        reason: String,
    },
}

/// Failure reported by a single format parser. The extractor attaches the format.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

/// A format parser: raw bytes in, plain text out. Must not do I/O.
pub type ParseFn = fn(&[u8]) -> Result<String, ParseError>;

/// Format-keyed dispatch table over the individual parsers.
#[derive(Clone)]
pub struct Extractor {
    parsers: HashMap<DocumentFormat, ParseFn>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
            .with_parser(DocumentFormat::Pdf, pdf::parse_pdf)
            .with_parser(DocumentFormat::Docx, docx::parse_docx)
            .with_parser(DocumentFormat::Doc, docx::parse_docx)
    }
}

impl Extractor {
    /// An extractor with no registered formats.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registers (or replaces) the parser for `format`.
    pub fn with_parser(mut self, format: DocumentFormat, parse: ParseFn) -> Self {
        self.parsers.insert(format, parse);
        self
    }

    /// Extracts the text of `document`.
    ///
    /// Blank output (an image-only PDF, an empty body) is returned as-is with a
    /// warning; the caller decides whether that is acceptable.
    pub async fn extract(&self, document: &SourceDocument) -> Result<ExtractedText, ExtractError> {
        let unsupported = || ExtractError::UnsupportedFormat {
            filename: document.filename.clone(),
        };

        let format = DocumentFormat::from_filename(&document.filename).ok_or_else(unsupported)?;
        let parse = *self.parsers.get(&format).ok_or_else(unsupported)?;

        if document.bytes.is_empty() {
            return Err(ExtractError::Extraction {
                format,
                reason: "file is empty".to_string(),
            });
        }

        debug!(
            "Extracting {} bytes from '{}' as {format}",
            document.bytes.len(),
            document.filename
        );

        let bytes = document.bytes.clone();
        let text = tokio::task::spawn_blocking(move || run_parser(parse, &bytes))
            .await
            .map_err(|e| ExtractError::Extraction {
                format,
                reason: format!("parser task failed: {e}"),
            })?
            .map_err(|e| ExtractError::Extraction {
                format,
                reason: e.0,
            })?;

        let text = ExtractedText::new(text);
        if text.is_blank() {
            warn!(
                "No text extracted from '{}' ({format}); the document may be image-only",
                document.filename
            );
        } else {
            info!(
                "Extracted {} chars from '{}' ({format})",
                text.as_str().len(),
                document.filename
            );
        }

        Ok(text)
    }
}

fn run_parser(parse: ParseFn, bytes: &[u8]) -> Result<String, ParseError> {
    std::panic::catch_unwind(|| parse(bytes))
        .unwrap_or_else(|_| Err(ParseError("parser panicked on malformed input".to_string())))
}
