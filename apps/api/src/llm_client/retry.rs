//! Bounded-attempt wrapper around a `TextGenerator`.
//!
//! Only `Unavailable` and `Timeout` are retried; the delay doubles after each
//! failed attempt. A retried call may return different text than the first
//! attempt would have.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{GenerationError, RawModelOutput, TextGenerator};
use crate::generation::prompts::CompiledPrompt;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `next_attempt` (2-based): base, 2×base, 4×base, ...
    fn delay_before(&self, next_attempt: u32) -> Duration {
        let exponent = next_attempt.saturating_sub(2).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

pub struct RetryingGenerator {
    inner: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl RetryingGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl TextGenerator for RetryingGenerator {
    async fn generate(&self, prompt: &CompiledPrompt) -> Result<RawModelOutput, GenerationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.inner.generate(prompt).await {
                Ok(output) => return Ok(output),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    if max_attempts == 1 {
                        return Err(e);
                    }
                    return Err(GenerationError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    attempt += 1;
                    let delay = self.policy.delay_before(attempt);
                    warn!(
                        "{} call failed ({e}); attempt {attempt}/{max_attempts} in {}ms",
                        self.inner.name(),
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
