//! Runtime for coaching turns
//!
//! Loads a session, performs the model calls for one turn, applies the pure
//! transition and commits the new session. Nothing is persisted unless the
//! whole turn succeeds.

mod executor;
pub mod handler;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{Coach, TurnOutcome};
pub use handler::PromptedStageHandler;
pub use traits::*;

use crate::llm::{LlmError, LlmErrorKind};
use crate::state_machine::TransitionError;
use thiserror::Error;

const GENERIC_FAILURE: &str = "I encountered an error. Please try again or reset the conversation.";
const SERVICE_BUSY: &str =
    "The AI service is busy right now. Please wait a moment and try again.";
const SERVICE_TIMEOUT: &str = "The AI service took too long to respond. Please try again.";
const SERVICE_UNREACHABLE: &str =
    "There was an issue connecting to the AI service. Please check server configuration.";
const CONVERSATION_TOO_LONG: &str =
    "The conversation has become too long. Please reset the conversation to continue.";

/// Failures at the turn boundary
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("LLM request failed ({}): {}", .0.kind.as_str(), .0.message)]
    Llm(#[from] LlmError),
    #[error("Session store error: {0}")]
    Store(String),
    #[error("No coaching model is configured")]
    Unconfigured,
    #[error(transparent)]
    Navigation(#[from] TransitionError),
}

impl TurnError {
    /// Safe, categorised text for the person using the coach
    pub fn user_message(&self) -> &'static str {
        match self {
            TurnError::Llm(e) => match e.kind {
                LlmErrorKind::RateLimit | LlmErrorKind::ServerError => SERVICE_BUSY,
                LlmErrorKind::Timeout => SERVICE_TIMEOUT,
                LlmErrorKind::Network | LlmErrorKind::Auth => SERVICE_UNREACHABLE,
                LlmErrorKind::InvalidRequest => CONVERSATION_TOO_LONG,
                LlmErrorKind::Unknown => GENERIC_FAILURE,
            },
            TurnError::Unconfigured => SERVICE_UNREACHABLE,
            TurnError::Store(_) | TurnError::Navigation(_) => GENERIC_FAILURE,
        }
    }

    /// Detailed text for logs and the separate diagnostic field
    pub fn diagnostic(&self) -> String {
        format!("An error occurred: {self}")
    }

    /// True when the failure is the model service being unavailable rather than a bug
    pub fn is_service_unavailable(&self) -> bool {
        match self {
            TurnError::Llm(e) => matches!(
                e.kind,
                LlmErrorKind::RateLimit
                    | LlmErrorKind::Timeout
                    | LlmErrorKind::Network
                    | LlmErrorKind::ServerError
            ),
            TurnError::Unconfigured => true,
            TurnError::Store(_) | TurnError::Navigation(_) => false,
        }
    }
}
