//! Coaching stage machine
//!
//! Pure state transitions over [`SessionState`]; all model I/O happens in
//! the runtime before an [`Event`] is built.

pub mod event;
pub mod session;
pub mod stage;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use event::{Event, StageReply};
pub use session::{CompletedStage, Progress, SessionState};
pub use stage::StageInfo;
pub use transition::{transition, CoachContext, TransitionError};
