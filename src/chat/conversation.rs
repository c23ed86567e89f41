//! Conversation state machine.
//!
//! Owns the ordered message list, the message lifecycle (pending /
//! streaming / final / error), persistence timing, and the busy flag that
//! gates user input. Drives the two-phase response protocol: a first stream
//! session whose finalized text may carry an attendance directive, and if
//! it does, a data fetch plus a second stream session whose output replaces
//! the placeholder text.
//!
//! Accumulated stream text is threaded through an explicit accumulator
//! value rather than captured by ambient closures, so the two passes can
//! never observe each other's state.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::message::{ChatMessage, Sender};
use super::prompts::{
    APOLOGY_TEXT, ASSISTANT_SYSTEM_PROMPT, CONSULTING_TEXT, FORMATTER_SYSTEM_PROMPT,
    FORMATTING_FAILED_TEXT,
};
use crate::attendance::client::{AttendanceApi, AttendanceClient};
use crate::attendance::dispatcher::{dispatch, second_pass_prompt};
use crate::config::AssistantConfig;
use crate::directive::detect;
use crate::error::ChatError;
use crate::store::MessageStore;
use crate::stream::session::{
    ChatClient, ChatRequest, SessionOutcome, StreamObserver, WireMessage, WireRole,
};

/// UI- and audio-facing seam of the conversation machine.
///
/// Implementations must be cheap and non-blocking: `messages_changed` fires
/// once per parsed content fragment while a response streams.
pub trait ConversationObserver: Send + Sync {
    /// The message list changed (new message, new fragment, finalization).
    fn messages_changed(&self, messages: &[ChatMessage]);

    /// The input-gate / typing-indicator flag changed.
    fn busy_changed(&self, busy: bool);

    /// Surface a one-time alert for a failed response.
    fn alert(&self, text: &str);

    /// Speak a finalized assistant reply (voice mode only).
    fn speak(&self, text: &str);
}

/// Threads accumulated text and UI republishing through one stream session.
///
/// Owns a snapshot of the message list with the in-flight placeholder; each
/// fragment updates the snapshot and republishes it. The terminal error, if
/// any, is captured for the conversation to act on after the session ends.
struct StreamAccumulator {
    messages: Vec<ChatMessage>,
    placeholder: usize,
    observer: Arc<dyn ConversationObserver>,
    text: String,
    error: Option<ChatError>,
}

impl StreamAccumulator {
    fn new(
        messages: Vec<ChatMessage>,
        placeholder: usize,
        observer: Arc<dyn ConversationObserver>,
    ) -> Self {
        Self {
            messages,
            placeholder,
            observer,
            text: String::new(),
            error: None,
        }
    }

    /// Consume the accumulator: accumulated text plus terminal error.
    fn finish(self) -> (String, Option<ChatError>) {
        (self.text, self.error)
    }
}

impl StreamObserver for StreamAccumulator {
    fn on_data(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        // Hold the redraw while the reply could still be a bare directive
        // marker; machine-only content must not flash up mid-stream.
        if crate::directive::starts_with_marker(&self.text) {
            return;
        }
        self.messages[self.placeholder].text = self.text.clone();
        self.observer.messages_changed(&self.messages);
    }

    fn on_done(&mut self) {}

    fn on_error(&mut self, error: ChatError) {
        self.error = Some(error);
    }
}

/// The conversation state machine.
pub struct Conversation {
    config: AssistantConfig,
    chat: ChatClient,
    attendance: Arc<dyn AttendanceApi>,
    store: MessageStore,
    observer: Arc<dyn ConversationObserver>,
    messages: Vec<ChatMessage>,
    busy: bool,
    cancel: CancellationToken,
}

impl Conversation {
    /// Create a conversation with real HTTP clients built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ConfigError`] if the configuration is invalid
    /// or a client cannot be built.
    pub fn new(
        config: AssistantConfig,
        store: MessageStore,
        observer: Arc<dyn ConversationObserver>,
    ) -> Result<Self, ChatError> {
        config.validate()?;
        let attendance: Arc<dyn AttendanceApi> =
            Arc::new(AttendanceClient::new(&config.attendance)?);
        Self::with_attendance(config, store, observer, attendance)
    }

    /// Create a conversation with an injected attendance seam.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ConfigError`] if the generation client cannot
    /// be built.
    pub fn with_attendance(
        config: AssistantConfig,
        store: MessageStore,
        observer: Arc<dyn ConversationObserver>,
        attendance: Arc<dyn AttendanceApi>,
    ) -> Result<Self, ChatError> {
        let chat = ChatClient::new(&config.generation)?;
        Ok(Self {
            config,
            chat,
            attendance,
            store,
            observer,
            messages: Vec::new(),
            busy: false,
            cancel: CancellationToken::new(),
        })
    }

    /// The ordered message list.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a response is in flight (user input is gated).
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// A handle the embedding application can use to cancel the in-flight
    /// session (screen exit, conversation clear).
    #[must_use]
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Load the persisted conversation from the store.
    ///
    /// Streaming flags left by a crash are cleared: nothing is in flight
    /// when a conversation is (re)constructed.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StorageError`] if the store is unreadable.
    pub async fn load(&mut self) -> Result<(), ChatError> {
        self.messages = self.store.load().await?;
        self.observer.messages_changed(&self.messages);
        Ok(())
    }

    /// Submit a user message and drive the full response flow.
    ///
    /// Appends the user message immediately, opens the first stream session,
    /// and on completion either finalizes the reply or runs the attendance
    /// two-phase flow. All failures end in a persisted, visible error
    /// message — never a crash, never a silent drop.
    pub async fn send(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.busy {
            tracing::warn!("send ignored: a response is already in flight");
            return;
        }

        self.messages.push(ChatMessage::user(text));
        self.observer.messages_changed(&self.messages);
        self.persist().await;

        self.set_busy(true);
        self.messages.push(ChatMessage::assistant_placeholder());
        let placeholder = self.messages.len() - 1;
        self.observer.messages_changed(&self.messages);

        let request = ChatRequest {
            prompt: text.to_owned(),
            system: ASSISTANT_SYSTEM_PROMPT.to_owned(),
            // History stops before the user message already carried in `prompt`.
            messages: self.rolling_history(placeholder - 1),
        };

        let cancel = self.cancel.clone();
        let mut accumulator = StreamAccumulator::new(
            self.messages.clone(),
            placeholder,
            Arc::clone(&self.observer),
        );
        let outcome = self.chat.stream(&request, &cancel, &mut accumulator).await;
        let (reply, error) = accumulator.finish();

        match outcome {
            SessionOutcome::Cancelled => {
                self.abandon_placeholder(placeholder);
            }
            SessionOutcome::Errored => {
                let error = error.unwrap_or_else(|| {
                    ChatError::TransportError("stream session failed".into())
                });
                tracing::error!(code = error.code(), "first pass failed: {}", error.message());
                self.fail_message(placeholder, APOLOGY_TEXT).await;
            }
            SessionOutcome::Done => match detect(&reply) {
                None => {
                    self.finalize_message(placeholder, reply).await;
                }
                Some(directive) => {
                    self.run_second_pass(placeholder, text, &reply, &directive).await;
                }
            },
        }
    }

    /// The attendance branch: fetch, then a second session whose output
    /// replaces the placeholder text. The directive text itself is never
    /// shown or persisted.
    async fn run_second_pass(
        &mut self,
        placeholder: usize,
        user_query: &str,
        first_pass_text: &str,
        directive: &crate::directive::Directive,
    ) {
        tracing::info!(
            query_type = %directive.query_type,
            "attendance directive detected, starting second pass"
        );

        // Keep any prose around the marker; the marker itself is machine-only.
        self.messages[placeholder].text =
            crate::directive::redact(first_pass_text, CONSULTING_TEXT);
        self.observer.messages_changed(&self.messages);

        let result = dispatch(self.attendance.as_ref(), directive).await;

        let request = ChatRequest {
            prompt: second_pass_prompt(user_query, &result),
            system: FORMATTER_SYSTEM_PROMPT.to_owned(),
            // The second pass is self-contained; no rolling history.
            messages: Vec::new(),
        };

        // Clear the transitional text before streaming the real answer in.
        self.messages[placeholder].text.clear();

        let cancel = self.cancel.clone();
        let mut accumulator = StreamAccumulator::new(
            self.messages.clone(),
            placeholder,
            Arc::clone(&self.observer),
        );
        let outcome = self.chat.stream(&request, &cancel, &mut accumulator).await;
        let (reply, error) = accumulator.finish();

        match outcome {
            SessionOutcome::Cancelled => {
                self.abandon_placeholder(placeholder);
            }
            SessionOutcome::Errored => {
                let error = ChatError::SecondPassError(
                    error
                        .map(|e| e.message().to_owned())
                        .unwrap_or_else(|| "stream session failed".into()),
                );
                tracing::error!(code = error.code(), "second pass failed: {}", error.message());
                self.fail_message(placeholder, FORMATTING_FAILED_TEXT).await;
            }
            SessionOutcome::Done => {
                self.finalize_message(placeholder, reply).await;
            }
        }
    }

    /// Clear the conversation: cancel anything in flight, drop all
    /// messages, force the busy flag off, persist the empty list.
    pub async fn reset(&mut self) {
        self.cancel.cancel();
        if self.busy {
            // A local cancel releases the connection but the remote side
            // keeps generating; ask it to stop too.
            let chat = self.chat.clone();
            tokio::spawn(async move { chat.stop().await });
        }
        self.cancel = CancellationToken::new();
        self.messages.clear();
        self.set_busy(false);
        self.observer.messages_changed(&self.messages);
        self.persist().await;
    }

    /// Finalize a streamed message: freeze, persist, optionally speak.
    async fn finalize_message(&mut self, index: usize, text: String) {
        let message = &mut self.messages[index];
        message.text = text;
        message.is_streaming = false;
        self.observer.messages_changed(&self.messages);
        self.set_busy(false);
        self.persist().await;

        if self.config.voice.enabled {
            let text = &self.messages[index].text;
            if !text.is_empty() {
                self.observer.speak(text);
            }
        }
    }

    /// Turn the in-flight message into a persisted, visible error.
    async fn fail_message(&mut self, index: usize, text: &str) {
        let message = &mut self.messages[index];
        message.text = text.to_owned();
        message.is_streaming = false;
        message.is_error = true;
        self.observer.messages_changed(&self.messages);
        self.set_busy(false);
        self.persist().await;
        self.observer.alert(text);
    }

    /// Drop a placeholder whose session was cancelled. Nothing is persisted;
    /// the placeholder never was.
    fn abandon_placeholder(&mut self, index: usize) {
        tracing::debug!("stream session cancelled, dropping placeholder");
        self.messages.remove(index);
        self.observer.messages_changed(&self.messages);
        self.set_busy(false);
    }

    /// Bounded rolling history for a generation request: the most recent
    /// finalized, non-error turns before `end`.
    fn rolling_history(&self, end: usize) -> Vec<WireMessage> {
        let window = self.config.history_window;
        let mut recent: Vec<&ChatMessage> = self.messages[..end]
            .iter()
            .filter(|m| !m.is_streaming && !m.is_error)
            .rev()
            .take(window)
            .collect();
        recent.reverse();
        recent
            .into_iter()
            .map(|m| WireMessage {
                role: match m.sender {
                    Sender::User => WireRole::User,
                    Sender::Assistant => WireRole::Assistant,
                },
                content: m.text.clone(),
            })
            .collect()
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            self.observer.busy_changed(busy);
        }
    }

    /// Write-through of the full message list. Awaited so a later mutation
    /// never races an earlier write, but a failed save only logs — the
    /// in-memory list stays authoritative for this session.
    async fn persist(&self) {
        if let Err(e) = self.store.save(&self.messages).await {
            tracing::warn!(code = e.code(), "failed to persist conversation: {}", e.message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct NullObserver;

    impl ConversationObserver for NullObserver {
        fn messages_changed(&self, _messages: &[ChatMessage]) {}
        fn busy_changed(&self, _busy: bool) {}
        fn alert(&self, _text: &str) {}
        fn speak(&self, _text: &str) {}
    }

    #[derive(Default)]
    struct PublishRecorder {
        published: Mutex<Vec<Vec<String>>>,
    }

    impl ConversationObserver for PublishRecorder {
        fn messages_changed(&self, messages: &[ChatMessage]) {
            self.published
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(messages.iter().map(|m| m.text.clone()).collect());
        }
        fn busy_changed(&self, _busy: bool) {}
        fn alert(&self, _text: &str) {}
        fn speak(&self, _text: &str) {}
    }

    fn placeholder_snapshot() -> Vec<ChatMessage> {
        vec![ChatMessage::user("hi"), ChatMessage::assistant_placeholder()]
    }

    // ── StreamAccumulator ─────────────────────────────────────

    #[test]
    fn accumulator_concatenates_fragments_in_order() {
        let mut accumulator =
            StreamAccumulator::new(placeholder_snapshot(), 1, Arc::new(NullObserver));
        accumulator.on_data("Hel");
        accumulator.on_data("lo");
        accumulator.on_done();
        let (text, error) = accumulator.finish();
        assert_eq!(text, "Hello");
        assert!(error.is_none());
    }

    #[test]
    fn accumulator_republishes_on_every_fragment() {
        let observer = Arc::new(PublishRecorder::default());
        let observer_dyn: Arc<dyn ConversationObserver> = observer.clone();
        let mut accumulator = StreamAccumulator::new(placeholder_snapshot(), 1, observer_dyn);
        accumulator.on_data("a");
        accumulator.on_data("b");

        let published = observer.published.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(published.len(), 2);
        assert_eq!(published[0][1], "a");
        assert_eq!(published[1][1], "ab");
    }

    // ── Construction ──────────────────────────────────────────

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = crate::config::AssistantConfig::default();
        config.generation.host = String::new();

        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!("tempdir succeeded"));
        let store = crate::store::MessageStore::new(dir.path())
            .unwrap_or_else(|_| unreachable!("store succeeded"));

        let result = Conversation::new(config, store, Arc::new(NullObserver));
        match result {
            Err(e) => assert_eq!(e.code(), "CONFIG_INVALID"),
            Ok(_) => unreachable!("construction should fail"),
        }
    }

    #[test]
    fn accumulator_captures_terminal_error() {
        let mut accumulator =
            StreamAccumulator::new(placeholder_snapshot(), 1, Arc::new(NullObserver));
        accumulator.on_error(ChatError::TransportError("HTTP 500".into()));
        let (text, error) = accumulator.finish();
        assert!(text.is_empty());
        match error {
            Some(e) => assert_eq!(e.code(), "TRANSPORT_FAILED"),
            None => unreachable!("error captured"),
        }
    }
}
