//! Event-payload parser for the generation stream protocol.
//!
//! Each decoded line is classified into zero or more [`StreamEvent`]s.
//! The protocol is a `data:`-prefixed JSON-per-line format:
//!
//! ```text
//! data: {"content":"Hel"}
//! data: {"content":"lo"}
//! data: {"done":true}
//! ```
//!
//! Anything that is not a well-formed `data:` line — other control lines,
//! an empty payload, malformed JSON — is ignored. A malformed line is logged
//! and swallowed; it must never abort an otherwise-healthy stream.

use serde::Deserialize;

/// A parsed protocol event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A fragment of assistant text.
    Content(String),
    /// End of stream signalled in-band by the server.
    Done,
}

/// Wire payload of one `data:` line.
#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    done: bool,
}

/// Parse one decoded line into its events.
///
/// Returns zero, one, or two events. When `content` and `done` appear on the
/// same line both are honored, content first. Re-parsing an ignorable line is
/// a no-op: it never raises and never emits.
pub fn parse_line(line: &str) -> Vec<StreamEvent> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Vec::new();
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Vec::new();
    }

    let chunk: ChunkPayload = match serde_json::from_str(payload) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, line = payload, "ignoring malformed stream payload");
            return Vec::new();
        }
    };

    let mut events = Vec::new();
    if let Some(content) = chunk.content
        && !content.is_empty()
    {
        events.push(StreamEvent::Content(content));
    }
    if chunk.done {
        events.push(StreamEvent::Done);
    }
    events
}
