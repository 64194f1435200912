//! PDF text extraction via `pdf-extract`. No OCR: scanned pages yield no text.

use super::ParseError;

/// Page separator in the extracted text.
const PAGE_SEPARATOR: &str = "\n\n";

pub fn parse_pdf(bytes: &[u8]) -> Result<String, ParseError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ParseError(format!("unreadable PDF: {e}")))?;
    Ok(join_pages(&pages))
}

/// Joins page texts in page order, dropping pages that carry no text.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}
