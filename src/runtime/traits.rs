//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the coach with mock implementations.

use super::TurnError;
use crate::db::Database;
use crate::history::ConversationTurn;
use crate::state_machine::SessionState;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for session state, keyed by an opaque session identifier
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a live session; `None` means start a brand-new one
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, String>;

    /// Replace the stored session
    async fn save(&self, session_id: &str, state: &SessionState) -> Result<(), String>;

    /// Forget a session entirely
    async fn delete(&self, session_id: &str) -> Result<(), String>;
}

/// What a stage handler is asked to respond to
#[derive(Debug, Clone, Copy)]
pub struct StageInput<'a> {
    pub stage: u8,
    pub user_input: &'a str,
    pub history: &'a [ConversationTurn],
    pub goal: Option<&'a str>,
}

/// Produces the raw model text for one stage turn.
///
/// The returned text is opaque to the caller until the marker codec parses it.
#[async_trait]
pub trait StageHandler: Send + Sync {
    async fn handle(&self, input: StageInput<'_>) -> Result<String, TurnError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, String> {
        (**self).load(session_id).await
    }

    async fn save(&self, session_id: &str, state: &SessionState) -> Result<(), String> {
        (**self).save(session_id, state).await
    }

    async fn delete(&self, session_id: &str) -> Result<(), String> {
        (**self).delete(session_id).await
    }
}

#[async_trait]
impl<T: StageHandler + ?Sized> StageHandler for Arc<T> {
    async fn handle(&self, input: StageInput<'_>) -> Result<String, TurnError> {
        (**self).handle(input).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as a `SessionStore`
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, String> {
        self.db.load_session(session_id).map_err(|e| e.to_string())
    }

    async fn save(&self, session_id: &str, state: &SessionState) -> Result<(), String> {
        self.db
            .save_session(session_id, state)
            .map_err(|e| e.to_string())
    }

    async fn delete(&self, session_id: &str) -> Result<(), String> {
        self.db.delete_session(session_id).map_err(|e| e.to_string())
    }
}
