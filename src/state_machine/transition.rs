//! Pure session transition function
//!
//! Given a session and an event, computes the next session and what to tell
//! the user. All model I/O happens before the event is built, so a turn that
//! fails never reaches this function and never mutates the session.

use super::event::{Event, StageReply};
use super::stage::{is_valid_stage, LAST_STAGE};
use super::SessionState;
use crate::extract::{Extractor, GoalExtractor};
use crate::history::{self, HistoryPolicy};
use crate::llm::MessageRole;
use crate::markers;
use crate::prompts::{stage_config, WELCOME_MESSAGE};
use crate::sentiment::update_ema;
use thiserror::Error;

/// Static inputs to the transition function
#[derive(Debug, Clone, Copy)]
pub struct CoachContext {
    pub history: HistoryPolicy,
    pub ema_alpha: f64,
}

impl Default for CoachContext {
    fn default() -> Self {
        Self {
            history: HistoryPolicy::default(),
            ema_alpha: crate::sentiment::DEFAULT_ALPHA,
        }
    }
}

/// User-visible part of a completed turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReply {
    /// Stage the turn was handled in
    pub stage: u8,
    pub display_text: String,
    pub evaluation_text: String,
    pub stage_completed: bool,
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_session: SessionState,
    pub reply: Option<TurnReply>,
}

impl TransitionResult {
    fn new(session: SessionState) -> Self {
        Self {
            new_session: session,
            reply: None,
        }
    }

    fn with_reply(mut self, reply: TurnReply) -> Self {
        self.reply = Some(reply);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Stage {target} is not completed yet (current stage is {current})")]
    StageNotPermitted { target: u8, current: u8 },
    #[error("Unknown stage: {0}")]
    UnknownStage(u8),
}

/// Pure transition function
pub fn transition(
    session: &SessionState,
    context: &CoachContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::TurnCompleted {
            user_input,
            reply,
            sentiment_score,
        } => Ok(complete_turn(session, context, user_input, reply, sentiment_score)),

        Event::NavigateTo { stage } => {
            if !is_valid_stage(stage) {
                return Err(TransitionError::UnknownStage(stage));
            }
            if !session.can_navigate_to(stage) {
                return Err(TransitionError::StageNotPermitted {
                    target: stage,
                    current: session.current_stage,
                });
            }
            Ok(TransitionResult::new(SessionState {
                current_stage: stage,
                ..session.clone()
            }))
        }

        Event::Reset => Ok(TransitionResult::new(SessionState::default())),
    }
}

fn complete_turn(
    session: &SessionState,
    context: &CoachContext,
    user_input: String,
    reply: StageReply,
    sentiment_score: i32,
) -> TransitionResult {
    let stage = session.current_stage;
    let mut next = session.clone();
    next.sentiment_ema = update_ema(session.sentiment_ema, sentiment_score, context.ema_alpha);

    let (body, display_text, evaluation_text, is_complete) = match reply {
        StageReply::Welcome => (
            WELCOME_MESSAGE.to_string(),
            markers::clean_display(WELCOME_MESSAGE),
            String::new(),
            false,
        ),
        StageReply::Model { raw } => {
            let parsed = markers::parse(&raw, stage_config(stage).completion);
            (parsed.body, parsed.display_text, parsed.evaluation, parsed.is_complete)
        }
    };

    if !evaluation_text.is_empty() {
        next.stage_evaluations
            .insert(stage.to_string(), evaluation_text.clone());
    }

    if is_complete {
        next.mark_completed(stage);
        if stage == 1 {
            match GoalExtractor.extract(&body) {
                Some(goal) => next.goal = Some(goal),
                None => tracing::warn!("Stage 1 completed but no goal could be extracted"),
            }
        }
        if stage < LAST_STAGE {
            next.current_stage = stage + 1;
        }
    }

    let appended = history::append(next.history, MessageRole::User, user_input);
    let appended = history::append(appended, MessageRole::Assistant, body);
    next.history = history::compact(&appended, &context.history);

    TransitionResult::new(next).with_reply(TurnReply {
        stage,
        display_text,
        evaluation_text,
        stage_completed: is_complete,
    })
}
