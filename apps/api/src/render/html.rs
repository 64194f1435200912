//! Markdown → HTML, plus the two page shells the renderer prints from.

use pulldown_cmark::{html, Event, Options, Parser};

const DOCUMENT_TITLE: &str = "Tailored Resume";

/// Print stylesheet for the PDF path. Page geometry is A4 with 40pt margins;
/// the same values are passed to the browser's print call.
const PRINT_STYLESHEET: &str = r#"
    @page { size: A4; margin: 40pt; }
    html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
    body { font-family: Arial, sans-serif; line-height: 1.6; margin: 0; color: #222; }
    h1, h2, h3 { color: #333; }
    h1 { border-bottom: 1px solid #ddd; padding-bottom: 10px; }
    h2 { margin-top: 20px; border-bottom: 1px solid #eee; padding-bottom: 5px; }
    ul { margin-top: 5px; }
    a { color: #0366d6; text-decoration: none; }
    p { margin: 5px 0; }
    table { border-collapse: collapse; }
    td, th { padding: 2px 8px; }
"#;

/// Word stylesheet for the DOC path.
const WORD_STYLESHEET: &str = r#"
    @page WordSection1 { size: 21cm 29.7cm; margin: 1cm 2cm; }
    div.WordSection1 { page: WordSection1; }
    body { font-family: Calibri, Arial, sans-serif; margin: 1cm 2cm; font-size: 11pt; }
    h1, h2, h3 { font-family: Calibri, Arial, sans-serif; }
    h1 { font-size: 18pt; }
    h2 { font-size: 14pt; }
    h3 { font-size: 12pt; }
    p, li { font-size: 11pt; line-height: 1.5; }
    a { color: #0366d6; }
"#;

/// CommonMark with tables and strikethrough. Raw HTML in the markdown is
/// emitted as text, so model output cannot inject markup into the print page.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Standalone HTML page for the headless browser.
pub fn print_document(body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{DOCUMENT_TITLE}</title>
<style>{PRINT_STYLESHEET}</style>
</head>
<body>
{body_html}
</body>
</html>
"#
    )
}

/// HTML carrying the Office namespaces and print view, which Word opens as a
/// native document.
pub fn word_document(body_html: &str) -> String {
    format!(
        r#"<html xmlns:o="urn:schemas-microsoft-com:office:office"
xmlns:w="urn:schemas-microsoft-com:office:word"
xmlns="http://www.w3.org/TR/REC-html40">
<head>
<meta charset="utf-8">
<meta http-equiv="Content-Type" content="text/html; charset=UTF-8">
<title>{DOCUMENT_TITLE}</title>
<!--[if gte mso 9]>
<xml>
<w:WordDocument>
<w:View>Print</w:View>
<w:Zoom>100</w:Zoom>
<w:DoNotOptimizeForBrowser/>
</w:WordDocument>
</xml>
<![endif]-->
<style>{WORD_STYLESHEET}</style>
</head>
<body>
<div class="WordSection1">
{body_html}
</div>
</body>
</html>
"#
    )
}
