//! API request and response types
//!
//! Field names follow the browser client's existing contract.

use crate::runtime::TurnOutcome;
use crate::state_machine::{CompletedStage, Progress, StageInfo};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_input: String,
}

/// Response for a chat turn, successful or not
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub main_response: String,
    pub evaluation_summary: String,
    pub completed_steps: Vec<CompletedStage>,
    pub current_step: u8,
    pub step_info: StageInfo,
    pub sentiment_score: i32,
    pub sentiment_ema: f64,
}

impl From<TurnOutcome> for ChatResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            main_response: outcome.display_text,
            evaluation_summary: outcome.evaluation_text,
            completed_steps: outcome.completed_stages,
            current_step: outcome.current_stage,
            step_info: outcome.stage_info,
            sentiment_score: outcome.sentiment_score,
            sentiment_ema: outcome.sentiment_ema,
        }
    }
}

impl ChatResponse {
    /// Failed turn: safe text in the main field, diagnostic in the evaluation field
    pub fn failure(user_message: &str, diagnostic: String, progress: Progress) -> Self {
        Self {
            main_response: user_message.to_string(),
            evaluation_summary: diagnostic,
            completed_steps: progress.completed_stages,
            current_step: progress.current_stage,
            step_info: progress.stage_info,
            sentiment_score: 0,
            sentiment_ema: progress.sentiment_ema,
        }
    }
}

/// Request to navigate to a stage
#[derive(Debug, Deserialize)]
pub struct SetStepRequest {
    pub step: u8,
}

/// Response for navigation and reset
#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub status: &'static str,
    pub current_step: u8,
    pub step_info: StageInfo,
}

impl StepResponse {
    pub fn success(step_info: StageInfo) -> Self {
        Self {
            status: "success",
            current_step: step_info.number,
            step_info,
        }
    }
}

/// Response for progress queries
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub current_step: u8,
    pub completed_steps: Vec<u8>,
    pub goal: Option<String>,
    pub step_info: StageInfo,
    pub all_steps: Vec<StageInfo>,
    pub sentiment_ema: f64,
}

impl From<Progress> for ProgressResponse {
    fn from(progress: Progress) -> Self {
        Self {
            current_step: progress.current_stage,
            completed_steps: progress.completed_stages.iter().map(|s| s.step).collect(),
            goal: progress.goal,
            step_info: progress.stage_info,
            all_steps: progress.all_stages,
            sentiment_ema: progress.sentiment_ema,
        }
    }
}

/// Response for the email summary
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub email_content: String,
}

/// Response for the health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}
