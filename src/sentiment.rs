//! Per-turn sentiment signal from a small auxiliary model call
//!
//! Scoring never fails a turn: client errors (timeouts included) and
//! unparseable replies degrade to a neutral score.

use crate::extract::{BoundedIntExtractor, Extractor};
use crate::llm::{call_with_retry, LlmMessage, LlmRequest, LlmService, RetryConfig};
use std::sync::Arc;

pub const NEUTRAL_SCORE: i32 = 0;
pub const MIN_SCORE: i32 = -10;
pub const MAX_SCORE: i32 = 10;
pub const DEFAULT_ALPHA: f64 = 0.3;

const SENTIMENT_PROMPT: &str = "Rate the emotional sentiment of the user's message on a scale \
from -10 (very negative) to 10 (very positive), where 0 is neutral. \
Respond with a single integer and nothing else.";

const MAX_INPUT_CHARS: usize = 2000;

/// Standard exponential smoothing: `alpha * new + (1 - alpha) * previous`
pub fn update_ema(previous: f64, new_score: i32, alpha: f64) -> f64 {
    alpha * f64::from(new_score) + (1.0 - alpha) * previous
}

/// Scores user input with an optional auxiliary model
pub struct SentimentScorer {
    service: Option<Arc<dyn LlmService>>,
    retry: RetryConfig,
    extractor: BoundedIntExtractor,
}

impl SentimentScorer {
    pub fn new(service: Option<Arc<dyn LlmService>>, retry: RetryConfig) -> Self {
        Self {
            service,
            retry,
            extractor: BoundedIntExtractor::new(MIN_SCORE..=MAX_SCORE),
        }
    }

    /// Score in `[-10, 10]`, or neutral when scoring is unavailable
    pub async fn score(&self, user_input: &str) -> i32 {
        let Some(service) = &self.service else {
            return NEUTRAL_SCORE;
        };

        let input: String = user_input.chars().take(MAX_INPUT_CHARS).collect();
        let request = LlmRequest {
            system: SENTIMENT_PROMPT.to_string(),
            messages: vec![LlmMessage::user(input)],
            max_tokens: 10,
        };

        match call_with_retry(&self.retry, || service.complete(&request)).await {
            Ok(response) => self.extractor.extract(&response.text).unwrap_or_else(|| {
                tracing::warn!(reply = %response.text, "Sentiment reply had no integer");
                NEUTRAL_SCORE
            }),
            Err(e) => {
                tracing::warn!(kind = e.kind.as_str(), error = %e.message, "Sentiment scoring failed");
                NEUTRAL_SCORE
            }
        }
    }
}
