//! HTTP API for the coach
//!
//! Thin integration layer: session cookie handling, JSON field naming and
//! status codes. All coaching behavior lives in `runtime`.

mod handlers;
mod session;
mod types;

pub use handlers::create_router;

use crate::runtime::{Coach, SessionStore, StageHandler};
use std::sync::Arc;

/// Coach over type-erased collaborators, so tests can swap them
pub type SharedCoach = Coach<Arc<dyn SessionStore>, Arc<dyn StageHandler>>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub coach: Arc<SharedCoach>,
    /// Coaching model id, when one is configured
    pub model: Option<String>,
}

impl AppState {
    pub fn new(coach: SharedCoach, model: Option<String>) -> Self {
        Self {
            coach: Arc::new(coach),
            model,
        }
    }
}
