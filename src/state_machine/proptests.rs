//! Property-based tests for the stage machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::stage::{FIRST_STAGE, LAST_STAGE};
use super::transition::*;
use super::*;
use crate::history::{serialized_size, ConversationTurn, HistoryPolicy};
use crate::llm::MessageRole;
use crate::markers::STEP_COMPLETE;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// A session whose completed stages are exactly those before the current one
fn arb_session() -> impl Strategy<Value = SessionState> {
    (
        FIRST_STAGE..=LAST_STAGE,
        proptest::option::of("[a-zA-Z ]{1,30}"),
        -10.0f64..=10.0,
        proptest::collection::vec(arb_turn(), 0..30),
    )
        .prop_map(|(current_stage, goal, sentiment_ema, history)| SessionState {
            current_stage,
            completed_stages: (FIRST_STAGE..current_stage).collect(),
            history,
            goal,
            sentiment_ema,
            ..SessionState::default()
        })
}

fn arb_turn() -> impl Strategy<Value = ConversationTurn> {
    (any::<bool>(), "[a-zA-Z .,!?]{0,300}").prop_map(|(is_user, content)| {
        let role = if is_user {
            MessageRole::User
        } else {
            MessageRole::Assistant
        };
        ConversationTurn::new(role, content)
    })
}

/// Model replies that never trip any stage's completion rule
fn arb_plain_reply() -> impl Strategy<Value = String> {
    "[a-z ,?]{0,200}"
}

fn arb_score() -> impl Strategy<Value = i32> {
    -10i32..=10
}

fn turn(raw: String, score: i32) -> Event {
    Event::TurnCompleted {
        user_input: "input".to_string(),
        reply: StageReply::Model { raw },
        sentiment_score: score,
    }
}

// ============================================================================
// Invariants
// ============================================================================

fn check_invariants(session: &SessionState) -> Result<(), TestCaseError> {
    prop_assert!((FIRST_STAGE..=LAST_STAGE).contains(&session.current_stage));

    let mut seen = session.completed_stages.clone();
    seen.sort_unstable();
    seen.dedup();
    prop_assert_eq!(seen.len(), session.completed_stages.len(), "duplicate completed stage");

    for stage in &session.completed_stages {
        prop_assert!((FIRST_STAGE..=LAST_STAGE).contains(stage));
    }
    prop_assert!(session.sentiment_ema.abs() <= 10.0 + 1e-9);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_sentinel_advances_exactly_one_stage(session in arb_session(), score in arb_score()) {
        let stage = session.current_stage;
        let result = transition(
            &session,
            &CoachContext::default(),
            turn(format!("Well done. {STEP_COMPLETE}"), score),
        ).unwrap();

        let next = result.new_session;
        prop_assert!(next.is_completed(stage));
        if stage < LAST_STAGE {
            prop_assert_eq!(next.current_stage, stage + 1);
        } else {
            prop_assert_eq!(next.current_stage, LAST_STAGE);
        }
        check_invariants(&next)?;
    }

    #[test]
    fn prop_plain_reply_never_changes_stage(
        session in arb_session(),
        raw in arb_plain_reply(),
        score in arb_score(),
    ) {
        let result = transition(&session, &CoachContext::default(), turn(raw, score)).unwrap();
        prop_assert_eq!(result.new_session.current_stage, session.current_stage);
        prop_assert_eq!(&result.new_session.completed_stages, &session.completed_stages);
        prop_assert_eq!(&result.new_session.goal, &session.goal);
    }

    #[test]
    fn prop_turns_preserve_invariants(
        session in arb_session(),
        replies in proptest::collection::vec((any::<bool>(), arb_plain_reply(), arb_score()), 1..20),
    ) {
        let mut current = session;
        for (complete, raw, score) in replies {
            let raw = if complete { format!("{raw} {STEP_COMPLETE}") } else { raw };
            current = transition(&current, &CoachContext::default(), turn(raw, score))
                .unwrap()
                .new_session;
            check_invariants(&current)?;
        }
    }

    #[test]
    fn prop_history_stays_within_policy(
        session in arb_session(),
        raw in "[a-zA-Z ]{0,1000}",
    ) {
        let policy = HistoryPolicy::default();
        let context = CoachContext { history: policy, ..CoachContext::default() };
        let next = transition(&session, &context, turn(raw, 0)).unwrap().new_session;

        prop_assert!(next.history.len() <= policy.max_messages);
        prop_assert!(
            serialized_size(&next.history) <= policy.budget_bytes
                || next.history.len() <= policy.fallback_keep
        );
    }

    #[test]
    fn prop_navigation_rejection_leaves_session_untouched(
        session in arb_session(),
        target in any::<u8>(),
    ) {
        match transition(&session, &CoachContext::default(), Event::NavigateTo { stage: target }) {
            Ok(result) => {
                prop_assert!(target == session.current_stage || session.is_completed(target));
                prop_assert_eq!(result.new_session.current_stage, target);
                prop_assert_eq!(&result.new_session.completed_stages, &session.completed_stages);
                prop_assert_eq!(&result.new_session.history, &session.history);
            }
            Err(TransitionError::UnknownStage(stage)) => {
                prop_assert_eq!(stage, target);
                prop_assert!(!(FIRST_STAGE..=LAST_STAGE).contains(&target));
            }
            Err(TransitionError::StageNotPermitted { target: t, current }) => {
                prop_assert_eq!(t, target);
                prop_assert_eq!(current, session.current_stage);
                prop_assert!(!session.is_completed(target));
            }
        }
    }

    #[test]
    fn prop_reset_is_total(session in arb_session()) {
        let result = transition(&session, &CoachContext::default(), Event::Reset).unwrap();
        prop_assert_eq!(result.new_session, SessionState::default());
    }

    #[test]
    fn prop_ema_stays_in_score_range(
        scores in proptest::collection::vec(arb_score(), 1..50),
    ) {
        let mut session = SessionState::default();
        for score in scores {
            session = transition(&session, &CoachContext::default(), turn(String::new(), score))
                .unwrap()
                .new_session;
            prop_assert!(session.sentiment_ema.abs() <= 10.0 + 1e-9);
        }
    }
}
