//! Coaching turn executor

use super::traits::{SessionStore, StageHandler, StageInput};
use super::TurnError;
use crate::prompts::is_greeting;
use crate::sentiment::{SentimentScorer, NEUTRAL_SCORE};
use crate::state_machine::stage::FIRST_STAGE;
use crate::state_machine::{
    transition, CoachContext, CompletedStage, Event, Progress, SessionState, StageInfo,
    StageReply,
};
use crate::summary;

/// Everything the caller needs to render one completed turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub display_text: String,
    pub evaluation_text: String,
    pub completed_stages: Vec<CompletedStage>,
    pub current_stage: u8,
    pub stage_info: StageInfo,
    pub sentiment_score: i32,
    pub sentiment_ema: f64,
}

/// Generic coach that can work with any session store and stage handler
pub struct Coach<S, H>
where
    S: SessionStore,
    H: StageHandler,
{
    store: S,
    handler: H,
    sentiment: SentimentScorer,
    context: CoachContext,
}

impl<S, H> Coach<S, H>
where
    S: SessionStore,
    H: StageHandler,
{
    pub fn new(store: S, handler: H, sentiment: SentimentScorer, context: CoachContext) -> Self {
        Self {
            store,
            handler,
            sentiment,
            context,
        }
    }

    /// Run one user turn against the session and commit the result.
    ///
    /// On failure the stored session is left exactly as it was.
    pub async fn process_turn(
        &self,
        session_id: &str,
        user_input: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let session = self.load(session_id).await?;
        let stage = session.current_stage;

        let (sentiment_score, reply) = if Self::is_opening_greeting(&session, user_input) {
            tracing::info!(session_id, "Greeting on a fresh session, sending welcome");
            (NEUTRAL_SCORE, StageReply::Welcome)
        } else {
            let input = StageInput {
                stage,
                user_input,
                history: &session.history,
                goal: session.goal.as_deref(),
            };
            let (score, raw) =
                tokio::join!(self.sentiment.score(user_input), self.handler.handle(input));
            (score, StageReply::Model { raw: raw? })
        };

        let result = transition(
            &session,
            &self.context,
            Event::TurnCompleted {
                user_input: user_input.to_string(),
                reply,
                sentiment_score,
            },
        )?;
        let next = result.new_session;
        let reply = result.reply.unwrap_or_default();

        self.save(session_id, &next).await?;

        if reply.stage_completed {
            tracing::info!(
                session_id,
                stage,
                next_stage = next.current_stage,
                "Stage completed"
            );
        }
        tracing::debug!(
            session_id,
            stage,
            history_len = next.history.len(),
            sentiment_score,
            "Turn committed"
        );

        let progress = next.progress();
        Ok(TurnOutcome {
            display_text: reply.display_text,
            evaluation_text: reply.evaluation_text,
            completed_stages: progress.completed_stages,
            current_stage: progress.current_stage,
            stage_info: progress.stage_info,
            sentiment_score,
            sentiment_ema: next.sentiment_ema,
        })
    }

    /// Start the session over from stage 1.
    ///
    /// The stored session is destroyed; the next request starts a fresh one.
    pub async fn reset(&self, session_id: &str) -> Result<Progress, TurnError> {
        let session = self.load(session_id).await?;
        let next = transition(&session, &self.context, Event::Reset)?.new_session;
        self.store
            .delete(session_id)
            .await
            .map_err(TurnError::Store)?;
        tracing::info!(session_id, "Session reset");
        Ok(next.progress())
    }

    /// Navigate to a completed stage or the current one
    pub async fn set_stage(&self, session_id: &str, stage: u8) -> Result<StageInfo, TurnError> {
        let session = self.load(session_id).await?;
        let next = transition(&session, &self.context, Event::NavigateTo { stage })
            .inspect_err(|e| tracing::info!(session_id, stage, error = %e, "Stage navigation rejected"))?
            .new_session;
        self.save(session_id, &next).await?;
        Ok(StageInfo::for_stage(next.current_stage))
    }

    pub async fn progress(&self, session_id: &str) -> Result<Progress, TurnError> {
        Ok(self.load(session_id).await?.progress())
    }

    /// Shareable email text for the session's goal and evaluations
    pub async fn summary(&self, session_id: &str) -> Result<String, TurnError> {
        let session = self.load(session_id).await?;
        Ok(summary::email_summary(&session))
    }

    fn is_opening_greeting(session: &SessionState, user_input: &str) -> bool {
        session.history.is_empty() && session.current_stage == FIRST_STAGE && is_greeting(user_input)
    }

    async fn load(&self, session_id: &str) -> Result<SessionState, TurnError> {
        self.store
            .load(session_id)
            .await
            .map(Option::unwrap_or_default)
            .map_err(TurnError::Store)
    }

    async fn save(&self, session_id: &str, state: &SessionState) -> Result<(), TurnError> {
        self.store
            .save(session_id, state)
            .await
            .map_err(TurnError::Store)
    }
}
