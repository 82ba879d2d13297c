//! Conversation history bounds
//!
//! History is persisted with the session, so it must stay under a byte
//! budget. Older entries are shortened lossily; the most recent window is
//! never touched because stage handlers rely on it for follow-up.

use crate::llm::{LlmMessage, MessageRole};
use serde::{Deserialize, Serialize};

const USER_PREFIX_CHARS: usize = 100;
const ASSISTANT_KEEP_CHARS: usize = 100;
const ASSISTANT_COMPRESS_THRESHOLD: usize = 200;
const USER_ELLIPSIS: &str = "...";
const ASSISTANT_TRIM_MARKER: &str = "...[content trimmed]...";

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Shortened form used for entries outside the recent window.
    ///
    /// Applying it to an already compressed turn returns the same turn.
    pub fn compressed(&self) -> Self {
        let len = self.content.chars().count();
        let content = match self.role {
            MessageRole::User if len > USER_PREFIX_CHARS => {
                format!("{}{USER_ELLIPSIS}", head_chars(&self.content, USER_PREFIX_CHARS))
            }
            MessageRole::Assistant if len > ASSISTANT_COMPRESS_THRESHOLD => format!(
                "{}{ASSISTANT_TRIM_MARKER}{}",
                head_chars(&self.content, ASSISTANT_KEEP_CHARS),
                tail_chars(&self.content, ASSISTANT_KEEP_CHARS)
            ),
            _ => self.content.clone(),
        };
        Self {
            role: self.role,
            content,
        }
    }
}

impl From<&ConversationTurn> for LlmMessage {
    fn from(turn: &ConversationTurn) -> Self {
        LlmMessage {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// Limits applied before a history is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPolicy {
    /// Hard cap on entry count
    pub max_messages: usize,
    /// Most recent entries that are never compressed
    pub recent_window: usize,
    /// Serialized size ceiling in bytes
    pub budget_bytes: usize,
    /// Entries kept when compression is not enough
    pub fallback_keep: usize,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            max_messages: 20,
            recent_window: 10,
            budget_bytes: 3500,
            fallback_keep: 5,
        }
    }
}

/// Append a turn
pub fn append(
    mut history: Vec<ConversationTurn>,
    role: MessageRole,
    content: impl Into<String>,
) -> Vec<ConversationTurn> {
    history.push(ConversationTurn::new(role, content));
    history
}

/// Keep only the most recent `max_messages` entries
pub fn truncate(history: &[ConversationTurn], max_messages: usize) -> Vec<ConversationTurn> {
    let start = history.len().saturating_sub(max_messages);
    history.iter().skip(start).cloned().collect()
}

/// Size of the history as it will be persisted
pub fn serialized_size(history: &[ConversationTurn]) -> usize {
    serde_json::to_vec(history).map_or(usize::MAX, |bytes| bytes.len())
}

/// Bring a history within `policy` for persistence.
///
/// Order: count cap, then compression of entries older than the recent
/// window if over budget, then the last `fallback_keep` entries if still
/// over budget.
pub fn compact(history: &[ConversationTurn], policy: &HistoryPolicy) -> Vec<ConversationTurn> {
    let capped = truncate(history, policy.max_messages);
    if serialized_size(&capped) <= policy.budget_bytes {
        return capped;
    }

    let boundary = capped.len().saturating_sub(policy.recent_window);
    let compressed: Vec<ConversationTurn> = capped
        .iter()
        .enumerate()
        .map(|(i, turn)| if i < boundary { turn.compressed() } else { turn.clone() })
        .collect();

    let size = serialized_size(&compressed);
    if size <= policy.budget_bytes {
        return compressed;
    }

    tracing::debug!(
        size,
        budget = policy.budget_bytes,
        keep = policy.fallback_keep,
        "History over budget after compression, keeping recent turns only"
    );
    truncate(&compressed, policy.fallback_keep)
}

/// The last `window` entries as model messages
pub fn context_window(history: &[ConversationTurn], window: usize) -> Vec<LlmMessage> {
    truncate(history, window).iter().map(LlmMessage::from).collect()
}

fn head_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn tail_chars(s: &str, n: usize) -> String {
    let skip = s.chars().count().saturating_sub(n);
    s.chars().skip(skip).collect()
}
