//! DOCX text extraction.
//!
//! A DOCX file is a ZIP archive; the body lives in `word/document.xml`. Only
//! `w:t` run text is kept. Tabs and breaks inside runs become `\t` / `\n`,
//! paragraphs are separated by a blank line, all formatting is dropped.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::ParseError;

const DOCUMENT_XML: &str = "word/document.xml";
const PARAGRAPH_SEPARATOR: &str = "\n\n";

pub fn parse_docx(bytes: &[u8]) -> Result<String, ParseError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ParseError(format!("not a DOCX (zip) container: {e}")))?;

    let mut xml = Vec::new();
    archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| ParseError(format!("missing {DOCUMENT_XML}: {e}")))?
        .read_to_end(&mut xml)
        .map_err(|e| ParseError(format!("failed to read {DOCUMENT_XML}: {e}")))?;

    document_text(&xml)
}

/// Walks `document.xml` and collects paragraph text in document order.
///
/// Paragraphs can nest (text boxes inside a run); an inner paragraph is
/// flushed on its own when it closes and the outer one keeps accumulating.
fn document_text(xml: &[u8]) -> Result<String, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => stack.push(String::new()),
                b"r" => run_depth += 1,
                b"t" if run_depth > 0 => in_text = true,
                name => push_run_control(&mut stack, run_depth, name),
            },
            Ok(Event::Empty(ref e)) => {
                push_run_control(&mut stack, run_depth, e.local_name().as_ref())
            }
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| ParseError(format!("bad text in {DOCUMENT_XML}: {err}")))?;
                if let Some(current) = stack.last_mut() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"p" => {
                    if let Some(paragraph) = stack.pop() {
                        let trimmed = paragraph.trim_end();
                        if !trimmed.is_empty() {
                            paragraphs.push(trimmed.to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError(format!(
                    "malformed {DOCUMENT_XML} at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs.join(PARAGRAPH_SEPARATOR))
}

/// Tab and break elements only count inside a run; `w:tab` under `w:tabs` is a
/// tab stop definition.
fn push_run_control(stack: &mut [String], run_depth: usize, name: &[u8]) {
    if run_depth == 0 {
        return;
    }
    let Some(current) = stack.last_mut() else {
        return;
    };
    match name {
        b"tab" => current.push('\t'),
        b"br" | b"cr" => current.push('\n'),
        _ => {}
    }
}
