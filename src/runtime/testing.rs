//! Mock implementations for testing
//!
//! These mocks enable testing the coach without real I/O.

use super::traits::{SessionStore, StageHandler, StageInput};
use super::TurnError;
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::state_machine::SessionState;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

#[allow(dead_code)]
impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Responses not yet consumed
    pub fn pending(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Scripted Stage Handler
// ============================================================================

/// Stage handler that replays scripted raw replies and records the stage it was asked for
pub struct ScriptedHandler {
    replies: Mutex<VecDeque<Result<String, TurnError>>>,
    /// Stage of every call, in order
    pub calls: Mutex<Vec<u8>>,
}

#[allow(dead_code)]
impl ScriptedHandler {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, raw: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(raw.into()));
        self
    }

    pub fn fail(self, error: TurnError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn recorded_stages(&self) -> Vec<u8> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for ScriptedHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StageHandler for ScriptedHandler {
    async fn handle(&self, input: StageInput<'_>) -> Result<String, TurnError> {
        self.calls.lock().unwrap().push(input.stage);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No scripted reply").into()))
    }
}

// ============================================================================
// In-Memory Session Store
// ============================================================================

/// In-memory session store for testing
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
    saves: Mutex<u32>,
}

#[allow(dead_code)]
impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            saves: Mutex::new(0),
        }
    }

    /// Seed a session directly
    pub fn insert(&self, session_id: &str, state: SessionState) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), state);
    }

    /// Current stored state for a session
    pub fn get(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> u32 {
        *self.saves.lock().unwrap()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, String> {
        Ok(self.get(session_id))
    }

    async fn save(&self, session_id: &str, state: &SessionState) -> Result<(), String> {
        self.insert(session_id, state.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), String> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }
}
