use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which text-generation backend serves tailor and refine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    Gemini,
}

impl LlmProvider {
    /// Model used when `LLM_MODEL` is not set.
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "claude-sonnet-4-5",
            LlmProvider::Gemini => "gemini-2.0-flash",
        }
    }

    fn api_key_var(self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::Gemini => "GOOGLE_GENAI_API_KEY",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(LlmProvider::Anthropic),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            other => bail!("Unknown LLM_PROVIDER '{other}' (expected 'anthropic' or 'gemini')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if the API key for the selected provider is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub llm_provider: LlmProvider,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_max_output_tokens: u32,
    pub llm_timeout: Duration,
    pub generation_max_attempts: u32,
    pub generation_retry_base: Duration,
    pub max_upload_bytes: usize,
    pub render_timeout: Duration,
    pub max_concurrent_renders: usize,
    pub chrome_executable: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_provider: LlmProvider = optional_env("LLM_PROVIDER", "gemini").parse()?;

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG", "info"),
            llm_provider,
            llm_api_key: require_env(llm_provider.api_key_var())?,
            llm_model: optional_env("LLM_MODEL", llm_provider.default_model()),
            llm_max_output_tokens: parse_env("LLM_MAX_OUTPUT_TOKENS", 2048)?,
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 120)?),
            generation_max_attempts: parse_env::<u32>("GENERATION_MAX_ATTEMPTS", 1)?.max(1),
            generation_retry_base: Duration::from_millis(parse_env(
                "GENERATION_RETRY_BASE_MS",
                1000,
            )?),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            render_timeout: Duration::from_secs(parse_env("RENDER_TIMEOUT_SECS", 30)?),
            max_concurrent_renders: parse_env::<usize>("MAX_CONCURRENT_RENDERS", 2)?.max(1),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
