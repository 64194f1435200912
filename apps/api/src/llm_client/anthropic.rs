//! Anthropic Messages API backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompts::MARKDOWN_ONLY_SYSTEM;
use super::{
    http_client, status_error, transport_error, GenerationError, GenerationSettings,
    RawModelOutput, TextGenerator,
};
use crate::generation::prompts::CompiledPrompt;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct AnthropicGenerator {
    client: Client,
    api_key: String,
    settings: GenerationSettings,
}

impl AnthropicGenerator {
    pub fn new(api_key: String, settings: GenerationSettings) -> reqwest::Result<Self> {
        Ok(Self {
            client: http_client(settings.timeout)?,
            api_key,
            settings,
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(&self, prompt: &CompiledPrompt) -> Result<RawModelOutput, GenerationError> {
        let request_body = AnthropicRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_output_tokens,
            system: MARKDOWN_ONLY_SYSTEM,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt.as_str(),
            }],
        };

        let timeout = self.settings.timeout;
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
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
        "anthropic"
    }
}

/// Pulls the human-readable message out of an error body, if it has one.
fn error_message(body: &str) -> String {
    serde_json::from_str::<AnthropicError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Concatenates every text block of a successful response.
fn parse_response(body: &str) -> Result<RawModelOutput, GenerationError> {
    let response: AnthropicResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    if let Some(usage) = &response.usage {
        debug!(
            "Anthropic call succeeded: input_tokens={}, output_tokens={}",
            usage.input_tokens, usage.output_tokens
        );
    }

    let text: String = response
        .content
        .iter()
        .filter(|b| b.block_type == "text")
        .filter_map(|b| b.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(RawModelOutput::new(text))
}
