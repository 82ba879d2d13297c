//! Bounded exponential-backoff retry around a single LLM call
//!
//! Attempts run with indices `0..=max_retries`. After a retryable failure at
//! attempt `n` the wrapper sleeps `base_delay * 2^n` plus up to one second of
//! jitter. Non-retryable failures propagate immediately.

use super::LlmError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt (0 = fail on first error)
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Add a uniform sub-second jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(2),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Backoff for the sleep that follows a failed attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        if self.jitter {
            backoff + Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..1.0))
        } else {
            backoff
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or retries are exhausted.
///
/// Returns the last error seen when every attempt failed.
pub async fn call_with_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.kind.is_retryable() && attempt < config.max_retries => {
                let mut delay = config.delay_for_attempt(attempt);
                if let Some(retry_after) = err.retry_after {
                    delay = delay.max(retry_after);
                }
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = %delay.as_millis(),
                    kind = err.kind.as_str(),
                    error = %err.message,
                    "LLM call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
