//! Scripted in-memory generator for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GenerationError, RawModelOutput, TextGenerator};
use crate::generation::prompts::CompiledPrompt;

/// Replays scripted results in order, then falls back to a fixed reply.
/// Every prompt it receives is recorded.
pub struct MockGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Always answers with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers with each scripted result once; afterwards every call is `EmptyResponse`.
    pub fn scripted(script: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &CompiledPrompt) -> Result<RawModelOutput, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result.map(RawModelOutput::new),
            None => self
                .fallback
                .clone()
                .map(RawModelOutput::new)
                .ok_or(GenerationError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
