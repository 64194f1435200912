// Cross-cutting prompt fragments sent with every generation call.
// The tailor and refine templates live in generation/prompts.rs.

/// System instruction that pins the output to bare markdown.
pub const MARKDOWN_ONLY_SYSTEM: &str = "You are an expert resume writer. \
    You MUST respond with the resume content only, formatted as Markdown. \
    Do NOT include any text before or after the resume. \
    Do NOT wrap the resume in code fences. \
    Do NOT include explanations or apologies.";
