//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The human user.
    User,
    /// The assistant.
    Assistant,
}

/// One conversation turn.
///
/// `text` is mutable only while `is_streaming` is true and only by the
/// session that owns the stream; once finalized the message is frozen.
/// At most one message in a conversation is streaming at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: String,
    /// The turn's text.
    pub text: String,
    /// Who produced the turn.
    pub sender: Sender,
    /// When the message was created. Set once.
    pub created_at: DateTime<Utc>,
    /// True from placeholder creation until the stream's terminal event.
    #[serde(default)]
    pub is_streaming: bool,
    /// True if this message surfaces a failure to the user.
    #[serde(default)]
    pub is_error: bool,
}

impl ChatMessage {
    /// Create a finalized user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            sender: Sender::User,
            created_at: Utc::now(),
            is_streaming: false,
            is_error: false,
        }
    }

    /// Create an empty assistant placeholder with `is_streaming` set.
    #[must_use]
    pub fn assistant_placeholder() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: String::new(),
            sender: Sender::Assistant,
            created_at: Utc::now(),
            is_streaming: true,
            is_error: false,
        }
    }
}
