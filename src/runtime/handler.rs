//! The single, configuration-driven stage handler

use super::traits::{StageHandler, StageInput};
use super::TurnError;
use crate::history;
use crate::llm::{call_with_retry, LlmRequest, LlmService, MessageRole, RetryConfig};
use crate::prompts::{stage_config, system_prompt};
use async_trait::async_trait;
use std::sync::Arc;

/// Sends the stage's prompt plus a windowed history to the coaching model
pub struct PromptedStageHandler {
    service: Option<Arc<dyn LlmService>>,
    retry: RetryConfig,
}

impl PromptedStageHandler {
    pub fn new(service: Option<Arc<dyn LlmService>>, retry: RetryConfig) -> Self {
        Self { service, retry }
    }

    /// Build the request for one turn without sending it
    pub fn build_request(input: &StageInput<'_>) -> LlmRequest {
        let config = stage_config(input.stage);
        let turns = history::append(
            input.history.to_vec(),
            MessageRole::User,
            input.user_input,
        );
        LlmRequest {
            system: system_prompt(config, input.goal, input.history),
            messages: history::context_window(&turns, config.context_window),
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl StageHandler for PromptedStageHandler {
    async fn handle(&self, input: StageInput<'_>) -> Result<String, TurnError> {
        let service = self.service.as_ref().ok_or(TurnError::Unconfigured)?;
        let request = Self::build_request(&input);

        tracing::debug!(
            stage = input.stage,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "Dispatching stage turn"
        );

        let response = call_with_retry(&self.retry, || service.complete(&request)).await?;
        Ok(response.text)
    }
}
