//! Output Normalizer: recovers the markdown payload from raw model output.
//!
//! The model sometimes wraps its answer in a ```` ```markdown ```` fence despite
//! being told not to. If such a fence is found, its inner content replaces the
//! whole output; otherwise the output is used verbatim. The match runs to the
//! last closing fence so code blocks inside the résumé stay intact.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::llm_client::RawModelOutput;

static MARKDOWN_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^```markdown[ \t]*\r?\n(.+)\r?\n```").expect("fence pattern is valid")
});

/// Canonical résumé markdown. Only `normalize` / `normalize_text` construct it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailoredMarkdown(String);

impl TailoredMarkdown {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

pub fn normalize(raw: &RawModelOutput) -> TailoredMarkdown {
    normalize_text(raw.as_str())
}

/// Same as `normalize`, for markdown handed back by a client.
pub fn normalize_text(text: &str) -> TailoredMarkdown {
    let inner = MARKDOWN_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    match inner {
        Some(inner) => TailoredMarkdown(inner.strip_suffix('\r').unwrap_or(inner).to_string()),
        None => TailoredMarkdown(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(text: &str) -> String {
        normalize(&RawModelOutput::new(text)).into_inner()
    }

    #[test]
    fn test_fenced_output_unwrapped() {
        assert_eq!(norm("```markdown\nX\n```"), "X");
    }

    #[test]
    fn test_unfenced_output_unchanged() {
        let raw = "# Jane Doe\n\n## Experience\n- Built things\n";
        assert_eq!(norm(raw), raw);
    }

    #[test]
    fn test_chatter_around_fence_dropped() {
        let raw = "Here is your resume:\n```markdown\n# Jane Doe\n## Skills\n```\nGood luck!";
        assert_eq!(norm(raw), "# Jane Doe\n## Skills");
    }

    #[test]
    fn test_nested_code_block_kept() {
        let raw = "```markdown\n# Jane\n```bash\ncargo build\n```\n## Skills\n```";
        assert_eq!(norm(raw), "# Jane\n```bash\ncargo build\n```\n## Skills");
    }

    #[test]
    fn test_crlf_fence() {
        assert_eq!(norm("```markdown\r\n# Jane\r\n```"), "# Jane");
    }

    #[test]
    fn test_other_fence_languages_untouched() {
        let raw = "```md\n# Jane\n```";
        assert_eq!(norm(raw), raw);
    }

    #[test]
    fn test_unclosed_fence_passes_through() {
        let raw = "```markdown\n# Jane Doe\n";
        assert_eq!(norm(raw), raw);
    }

    #[test]
    fn test_empty_fence_passes_through() {
        let raw = "```markdown\n\n```";
        assert_eq!(norm(raw), raw);
    }

    #[test]
    fn test_normalize_is_idempotent_on_its_output() {
        let once = norm("```markdown\n# Jane\n```");
        assert_eq!(normalize_text(&once).into_inner(), once);
    }
}
