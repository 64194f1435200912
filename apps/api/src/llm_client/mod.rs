/// LLM Client: the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call a model API directly.
/// Callers hold an `Arc<dyn TextGenerator>` and pass it explicitly.
///
/// One attempt per call. Retries live in `retry::RetryingGenerator`, which is
/// only installed when `GENERATION_MAX_ATTEMPTS > 1`.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::info;

use crate::config::{Config, LlmProvider};
use crate::generation::prompts::CompiledPrompt;

pub mod anthropic;
pub mod gemini;
#[cfg(test)]
pub mod mock;
pub mod prompts;
pub mod retry;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Model backend unavailable: {0}")]
    Unavailable(String),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model backend rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Model response could not be decoded: {0}")]
    MalformedResponse(String),

    #[error("Model returned no text content")]
    EmptyResponse,

    #[error("Model still failing after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Unavailable(_) | GenerationError::Timeout(_)
        )
    }
}

/// Unprocessed text as returned by the backend. May still carry fences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelOutput(String);

impl RawModelOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A text-generation backend. Stateless: every call carries its full context.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &CompiledPrompt) -> Result<RawModelOutput, GenerationError>;

    /// Backend label for log lines.
    fn name(&self) -> &str;
}

/// Per-backend request settings.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm_model.clone(),
            max_output_tokens: config.llm_max_output_tokens,
            timeout: config.llm_timeout,
        }
    }
}

/// Builds the configured backend, wrapped in the retry policy when enabled.
pub fn build_generator(config: &Config) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let settings = GenerationSettings::from_config(config);
    let api_key = config.llm_api_key.clone();

    let backend: Arc<dyn TextGenerator> = match config.llm_provider {
        LlmProvider::Anthropic => Arc::new(anthropic::AnthropicGenerator::new(api_key, settings)?),
        LlmProvider::Gemini => Arc::new(gemini::GeminiGenerator::new(api_key, settings)?),
    };

    if config.generation_max_attempts > 1 {
        info!(
            "Generation retries enabled: {} attempts, base delay {:?}",
            config.generation_max_attempts, config.generation_retry_base
        );
        let policy = retry::RetryPolicy {
            max_attempts: config.generation_max_attempts,
            base_delay: config.generation_retry_base,
        };
        return Ok(Arc::new(retry::RetryingGenerator::new(backend, policy)));
    }

    Ok(backend)
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

/// Maps a transport-level failure. Timeouts are reported separately.
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout(timeout)
    } else {
        GenerationError::Unavailable(err.to_string())
    }
}

/// Maps a non-success status. 429 and 5xx mean the backend is unavailable.
pub(crate) fn status_error(status: StatusCode, message: String) -> GenerationError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        GenerationError::Unavailable(format!("status {}: {message}", status.as_u16()))
    } else {
        GenerationError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}
