//! Stream session controller for the generation endpoint.
//!
//! One [`StreamSession`](ChatClient::stream) is one chunked HTTP exchange:
//! `OPEN → (READING)* → {DONE | ERRORED}`, plus a caller-driven cancelled
//! exit. Events are dispatched to the observer synchronously, in exact
//! decode order; exactly one of `on_done`/`on_error` fires per session, and
//! a cancelled session fires neither.
//!
//! There is no automatic retry at this layer. A failed session is terminal;
//! recovery is a new user action decided by the conversation state machine.

use std::time::Duration;

use futures_util::StreamExt;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::decoder::LineDecoder;
use super::parser::{StreamEvent, parse_line};
use crate::config::GenerationConfig;
use crate::error::ChatError;

/// Role of a history entry on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    /// The human side of the conversation.
    User,
    /// The model side of the conversation.
    Assistant,
}

/// One rolling-history entry sent with a generation request.
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    /// Who produced the turn.
    pub role: WireRole,
    /// The turn's text.
    pub content: String,
}

/// Request body of the streaming generation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The new user prompt.
    pub prompt: String,
    /// System instructions for this pass.
    pub system: String,
    /// Bounded rolling history (may be empty, e.g. on a second pass).
    pub messages: Vec<WireMessage>,
}

/// Observer for one stream session.
///
/// `on_data` fires zero or more times, then exactly one of `on_done` /
/// `on_error` — unless the session is cancelled, in which case dispatch
/// simply stops.
pub trait StreamObserver {
    /// A fragment of assistant text arrived.
    fn on_data(&mut self, fragment: &str);
    /// The stream completed normally.
    fn on_done(&mut self);
    /// The stream failed; no further callbacks will fire.
    fn on_error(&mut self, error: ChatError);
}

/// How a stream session terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// `on_done` fired: in-band done event or end of body.
    Done,
    /// `on_error` fired: transport failure, bad status, or deadline.
    Errored,
    /// The caller cancelled; no terminal callback fired.
    Cancelled,
}

/// Client for the streaming text-generation endpoint.
///
/// Holds the reqwest client and the endpoint derived from configuration;
/// the configuration is taken at construction, never read from globals.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl ChatClient {
    /// Create a client for the configured generation endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ConfigError`] if the HTTP client cannot be built.
    pub fn new(config: &GenerationConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Run one stream session, dispatching events to `observer`.
    ///
    /// The session deadline (`request_timeout_secs`) covers the whole
    /// exchange, connect included. Cancellation is checked between chunk
    /// reads; a cancelled session releases the connection and dispatches
    /// nothing further.
    pub async fn stream(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
        observer: &mut dyn StreamObserver,
    ) -> SessionOutcome {
        let url = self.config.stream_url();
        let deadline = Instant::now() + Duration::from_secs(self.config.request_timeout_secs);
        tracing::debug!(%url, prompt_len = request.prompt.len(), "opening stream session");

        let send = self.client.post(&url).json(request).send();
        let response = tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("stream session cancelled before response");
                return SessionOutcome::Cancelled;
            }
            result = tokio::time::timeout_at(deadline, send) => match result {
                Err(_) => {
                    observer.on_error(ChatError::TimeoutError(format!(
                        "no response within {}s",
                        self.config.request_timeout_secs
                    )));
                    return SessionOutcome::Errored;
                }
                Ok(Err(e)) => {
                    observer.on_error(ChatError::TransportError(format!(
                        "stream request failed: {e}"
                    )));
                    return SessionOutcome::Errored;
                }
                Ok(Ok(response)) => response,
            },
        };

        let status = response.status();
        if !status.is_success() {
            observer.on_error(ChatError::TransportError(format!(
                "stream endpoint returned HTTP {status}"
            )));
            return SessionOutcome::Errored;
        }

        let mut body = Box::pin(response.bytes_stream());
        let mut decoder = LineDecoder::new();

        loop {
            let read = tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("stream session cancelled mid-read");
                    return SessionOutcome::Cancelled;
                }
                result = tokio::time::timeout_at(deadline, body.next()) => result,
            };

            match read {
                Err(_) => {
                    observer.on_error(ChatError::TimeoutError(format!(
                        "stream exceeded {}s deadline",
                        self.config.request_timeout_secs
                    )));
                    return SessionOutcome::Errored;
                }
                Ok(Some(Err(e))) => {
                    observer.on_error(ChatError::TransportError(format!(
                        "stream read failed: {e}"
                    )));
                    return SessionOutcome::Errored;
                }
                Ok(Some(Ok(chunk))) => {
                    for line in decoder.push(&chunk) {
                        if dispatch_line(&line, observer) {
                            return SessionOutcome::Done;
                        }
                    }
                }
                Ok(None) => {
                    // Body ended without an in-band done event.
                    if let Some(line) = decoder.flush()
                        && dispatch_line(&line, observer)
                    {
                        return SessionOutcome::Done;
                    }
                    observer.on_done();
                    return SessionOutcome::Done;
                }
            }
        }
    }

    /// Best-effort remote stop of an in-flight generation.
    ///
    /// Mirrors the client app's stop call; failures are logged, never
    /// surfaced — local cancellation does not depend on it.
    pub async fn stop(&self) {
        let url = self.config.stop_url();
        let result = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "stop": true }))
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("remote stream stop acknowledged");
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), "remote stream stop rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote stream stop failed");
            }
        }
    }
}

/// Dispatch one decoded line; returns true when the terminal event fired.
fn dispatch_line(line: &str, observer: &mut dyn StreamObserver) -> bool {
    for event in parse_line(line) {
        match event {
            StreamEvent::Content(text) => observer.on_data(&text),
            StreamEvent::Done => {
                observer.on_done();
                return true;
            }
        }
    }
    false
}
