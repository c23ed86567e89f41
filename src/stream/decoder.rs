//! Incremental line decoder for chunked streaming response bodies.
//!
//! Converts raw byte chunks into complete, trimmed protocol lines. Chunks
//! may split lines — and multi-byte UTF-8 sequences — at arbitrary
//! boundaries, so the decoder splits on `\n` at the byte level and only
//! decodes complete lines: a multi-byte sequence can never straddle a line
//! boundary, and bytes held back in the buffer are never decoded twice.
//!
//! # Examples
//!
//! ```
//! use palaver::stream::LineDecoder;
//!
//! let mut decoder = LineDecoder::new();
//! assert!(decoder.push(b"data: {\"content\"").is_empty());
//! let lines = decoder.push(b": \"ol\xc3\xa1\"}\n");
//! assert_eq!(lines, vec!["data: {\"content\": \"ol\u{e1}\"}"]);
//! ```

/// Incremental decoder from byte chunks to trimmed lines.
///
/// One decoder per stream session; it is not restartable. Empty lines are
/// consumed here and never surfaced downstream.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Unconsumed bytes: the tail of the last chunk with no `\n` yet.
    buffer: Vec<u8>,
    /// Position up to which `buffer` has already been scanned for `\n`.
    scanned: usize,
}

impl LineDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk of bytes, returning every complete line it finishes.
    ///
    /// Lines are trimmed of surrounding whitespace (including `\r` from
    /// CRLF bodies); lines that trim to empty are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = memchr_newline(&self.buffer[self.scanned..]) {
            let end = self.scanned + offset;
            if let Some(line) = decode_trimmed(&self.buffer[..end]) {
                lines.push(line);
            }
            self.buffer.drain(..=end);
            self.scanned = 0;
        }
        // Everything up to the end has been scanned; resume there next push.
        self.scanned = self.buffer.len();

        lines
    }

    /// Flush a trailing unterminated line once the body has ended.
    pub fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        decode_trimmed(&rest)
    }
}

/// Find the first `\n` in `haystack`.
fn memchr_newline(haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|&b| b == b'\n')
}

/// Decode one complete line, trim it, and drop it if empty.
///
/// A complete line contains only whole UTF-8 sequences on well-formed input;
/// anything invalid is replaced rather than aborting the stream.
fn decode_trimmed(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
