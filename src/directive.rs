//! Embedded tool-call directive detection.
//!
//! The first generation pass may embed a structured marker in its output
//! when it needs external attendance data:
//!
//! ```text
//! [ATTENDANCE_QUERY: check_entry | Ana]
//! ```
//!
//! The marker is machine-only content: the conversation machine replaces it
//! with transitional text and it is never shown to the user. Generated text
//! is untrusted input — only the first structurally valid occurrence is
//! honored, and the extracted type string is validated against the closed
//! query-kind enum at dispatch time rather than trusted here.

/// Literal opener of the directive marker.
const MARKER: &str = "[ATTENDANCE_QUERY:";

/// A directive extracted from finalized assistant text.
///
/// Ephemeral: produced and consumed within one response-processing pass,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The raw query-type token (trimmed, unvalidated).
    pub query_type: String,
    /// The raw parameter string (trimmed).
    pub parameters: String,
}

/// Scan finalized assistant text for an embedded directive.
///
/// Returns the first match only; anything after it is ignored. A match
/// requires the literal `[ATTENDANCE_QUERY:` opener, a `|` field separator,
/// and a closing `]`, with both fields trimmed of surrounding whitespace.
pub fn detect(text: &str) -> Option<Directive> {
    find(text).map(|(_, directive)| directive)
}

/// Replace the matched directive substring with `replacement`.
///
/// Surrounding prose is kept; text without a directive comes back unchanged.
pub fn redact(text: &str, replacement: &str) -> String {
    match find(text) {
        Some((span, _)) => {
            let mut redacted = String::with_capacity(text.len());
            redacted.push_str(&text[..span.start]);
            redacted.push_str(replacement);
            redacted.push_str(&text[span.end..]);
            redacted
        }
        None => text.to_owned(),
    }
}

/// Whether `text` (leading whitespace ignored) could still turn out to be a
/// directive marker: either it begins with the full opener, or it is a
/// prefix of one. Used to hold live redraws of machine-only content.
pub(crate) fn starts_with_marker(text: &str) -> bool {
    let text = text.trim_start();
    if text.len() < MARKER.len() {
        MARKER.as_bytes().starts_with(text.as_bytes())
    } else {
        text.starts_with(MARKER)
    }
}

/// Locate the first structurally valid directive and its byte span.
fn find(text: &str) -> Option<(std::ops::Range<usize>, Directive)> {
    let start = text.find(MARKER)?;
    let rest = &text[start + MARKER.len()..];
    let end = rest.find(']')?;
    let inner = &rest[..end];

    let (query_type, parameters) = inner.split_once('|')?;
    let query_type = query_type.trim();
    if query_type.is_empty() {
        return None;
    }

    let span = start..start + MARKER.len() + end + 1;
    Some((
        span,
        Directive {
            query_type: query_type.to_owned(),
            parameters: parameters.trim().to_owned(),
        },
    ))
}
