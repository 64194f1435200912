// Prompt Compiler: the two fixed instruction templates and their substitution.
// System-level fragments shared by every call live in llm_client::prompts.

use crate::models::resume::GenerationContext;

/// Tailor template. Placeholders: `{resume}`, `{jobDescription}`.
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"You are an expert resume tailor who specializes in customizing resumes to match job descriptions.

# Original Resume:
{resume}

# Job Description:
{jobDescription}

Your task is to create a tailored version of the resume that:
1. Highlights skills, experiences, and qualifications that match the job description
2. Uses relevant keywords from the job description
3. Maintains the same factual information (no fabrication)
4. Reorganizes content to emphasize relevant experience
5. Uses professional, clear, and concise language
6. Maintains a clean, professional format

Create the tailored resume in Markdown format with appropriate sections (Education, Experience, Skills, etc.).
Focus on honesty while positioning the candidate's actual experience to best match the job requirements.

Instructions:
- Review the original resume and job description carefully.
- Identify key skills, experiences, and qualifications that match the job description.
- Use relevant keywords from the job description in the tailored resume.
- Ensure the tailored resume is well-organized and professional.
- Do NOT invent employers, titles, dates, degrees, or achievements that are not in the original resume.

MAKE SURE THE RESUME FOLLOWS THE INDUSTRY STANDARDS FOR FORMATTING AND IS WELL-TAILORED TO THE JOB DESCRIPTION.

The response must contain ONLY the tailored resume content in Markdown format.

# Tailored Resume (in Markdown format):"#;

/// Refine template. Placeholders: `{resume}`, `{feedback}`.
pub const REFINE_PROMPT_TEMPLATE: &str = r#"You are an expert resume tailor who specializes in customizing resumes.

# Current Resume Draft:
{resume}

# Feedback from the user:
{feedback}

Your task is to refine the resume based on the feedback while:
1. Maintaining professional tone and language
2. Ensuring all content is factually consistent with the current draft
3. Addressing all points mentioned in the feedback
4. Keeping the resume well-organized and formatted in Markdown

Instructions:
- Review the feedback carefully and make the necessary changes to the resume.
- Focus on improving clarity, relevance, and impact of the resume content.
- The response should be a refined version of the current draft with the requested changes.

The response must contain ONLY the resume content in Markdown format.

# Refined Resume (in Markdown format):"#;

/// The exact text sent to the model. Same context, same prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPrompt(String);

impl CompiledPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Substitutes `context` into its template. Pure.
pub fn compile(context: &GenerationContext) -> CompiledPrompt {
    let text = match context {
        GenerationContext::Tailor {
            resume_text,
            job_description,
        } => fill(
            TAILOR_PROMPT_TEMPLATE,
            &[
                ("resume", resume_text.as_str()),
                ("jobDescription", job_description.as_str()),
            ],
        ),
        GenerationContext::Refine {
            current_draft,
            feedback,
        } => fill(
            REFINE_PROMPT_TEMPLATE,
            &[
                ("resume", current_draft.as_str()),
                ("feedback", feedback.as_str()),
            ],
        ),
    };
    CompiledPrompt(text)
}

/// Single left-to-right pass over the template. Substituted values are never
/// rescanned, so `{feedback}` typed into a résumé stays literal.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        let hit = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));

        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}
