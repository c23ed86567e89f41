//! Conversation layer: messages, prompts, and the state machine.

pub mod conversation;
pub mod message;
pub mod prompts;

pub use conversation::{Conversation, ConversationObserver};
pub use message::{ChatMessage, Sender};
