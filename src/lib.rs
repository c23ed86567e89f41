//! Palaver: streaming conversation core for a voice-enabled assistant client.
//!
//! The embedding application (screens, audio capture/playback, settings UI)
//! stays outside this crate; palaver owns the protocol and state machine in
//! the middle:
//!
//! - **Stream decoding** — chunked HTTP response bytes → protocol lines →
//!   content/done events, dispatched in order to a session observer
//! - **Two-phase responses** — a first generation pass may embed an
//!   attendance directive; the dispatcher fetches and normalizes the data
//!   and a second pass turns it into the final answer
//! - **Conversation state** — ordered message list, message lifecycle,
//!   busy gating, write-through JSON persistence
//!
//! # Architecture
//!
//! ```text
//! user input → Conversation → ChatClient (stream session)
//!                   ↑               ↓ fragments
//!                   └── directive? → AttendanceClient → second session
//! ```
//!
//! Configuration is loaded once per conversation ([`AssistantConfig`]) and
//! passed into the constructors; there is no global state.

pub mod attendance;
pub mod chat;
pub mod config;
pub mod directive;
pub mod error;
pub mod store;
pub mod stream;

pub use attendance::{AttendanceApi, AttendanceClient, AttendanceRecord, AttendanceResult};
pub use chat::{ChatMessage, Conversation, ConversationObserver, Sender};
pub use config::AssistantConfig;
pub use directive::{Directive, detect};
pub use error::{ChatError, Result};
pub use store::MessageStore;
pub use stream::{ChatClient, ChatRequest, SessionOutcome, StreamObserver};
