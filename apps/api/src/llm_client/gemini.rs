//! Google Gemini `generateContent` backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::prompts::MARKDOWN_ONLY_SYSTEM;
use super::{
    http_client, status_error, transport_error, GenerationError, GenerationSettings,
    RawModelOutput, TextGenerator,
};
use crate::generation::prompts::CompiledPrompt;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    settings: GenerationSettings,
}

impl GeminiGenerator {
    pub fn new(api_key: String, settings: GenerationSettings) -> reqwest::Result<Self> {
        Ok(Self {
            client: http_client(settings.timeout)?,
            api_key,
            settings,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{GEMINI_API_BASE}/models/{}:generateContent",
            self.settings.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &CompiledPrompt) -> Result<RawModelOutput, GenerationError> {
        let request_body = build_request(prompt.as_str(), self.settings.max_output_tokens);

        let timeout = self.settings.timeout;
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        if !status.is_success() {
            return Err(status_error(status, error_message(&body)));
        }

        parse_response(&body)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

fn build_request(prompt: &str, max_output_tokens: u32) -> GeminiRequest<'_> {
    GeminiRequest {
        system_instruction: GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: MARKDOWN_ONLY_SYSTEM,
            }],
        },
        contents: vec![GeminiContent {
            role: Some("user"),
            parts: vec![GeminiPart { text: prompt }],
        }],
        generation_config: GenerationConfig { max_output_tokens },
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<GeminiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Takes the first candidate's text parts, concatenated.
fn parse_response(body: &str) -> Result<RawModelOutput, GenerationError> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    if let Some(usage) = &response.usage_metadata {
        debug!(
            "Gemini call succeeded: prompt_tokens={:?}, output_tokens={:?}",
            usage.prompt_token_count, usage.candidates_token_count
        );
    }

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        warn!("Gemini blocked the prompt: {reason}");
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::EmptyResponse);
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason == "MAX_TOKENS" {
            warn!("Gemini output truncated at the max output token limit");
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(RawModelOutput::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_camel_case_and_token_limit() {
        let json = serde_json::to_value(build_request("tailor this", 2048)).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "tailor this");
        assert!(json["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_parse_response_first_candidate() {
        let body = r##"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "# Jane"}, {"text": " Doe"}]}, "finishReason": "STOP"},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
        }"##;
        assert_eq!(parse_response(body).unwrap().as_str(), "# Jane Doe");
    }

    #[test]
    fn test_blocked_prompt_is_empty_response() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert!(matches!(parse_response(body), Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn test_candidate_without_content_is_empty_response() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert!(matches!(parse_response(body), Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn test_error_message_extracted() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid");
    }
}
