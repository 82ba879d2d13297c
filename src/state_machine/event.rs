//! Events that drive session transitions

/// What produced the assistant side of a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageReply {
    /// Canned welcome for a greeting on a fresh session; no model call
    Welcome,
    /// Raw text from the current stage's handler
    Model { raw: String },
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A user message was answered
    TurnCompleted {
        user_input: String,
        reply: StageReply,
        sentiment_score: i32,
    },
    /// Explicit navigation to a stage
    NavigateTo { stage: u8 },
    /// Start over
    Reset,
}
