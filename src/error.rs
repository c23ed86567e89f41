//! Error types for the conversation core.
//!
//! Each error variant carries a stable error code (SCREAMING_SNAKE_CASE)
//! that is included in the Display output and accessible via [`ChatError::code()`].
//! Codes are part of the public API contract and will not change.
//!
//! Decode-level problems (a malformed protocol line or JSON payload inside a
//! stream) deliberately have no variant here: they are logged and swallowed
//! inside the parser and never escape a session.

/// Stable error codes for programmatic error handling.
///
/// These codes never change and form part of the public API contract.
/// Use these for distinguishing errors rather than parsing Display output.
pub mod error_codes {
    /// Invalid or missing configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// Network or HTTP failure on a stream session.
    pub const TRANSPORT_FAILED: &str = "TRANSPORT_FAILED";

    /// A stream session exceeded its deadline.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// An external data call made for a directive failed.
    pub const DISPATCH_FAILED: &str = "DISPATCH_FAILED";

    /// The second generation pass failed after a successful data fetch.
    pub const SECOND_PASS_FAILED: &str = "SECOND_PASS_FAILED";

    /// Conversation persistence failed.
    pub const STORAGE_FAILED: &str = "STORAGE_FAILED";
}

/// Errors produced by the conversation core.
///
/// Each variant includes a stable error code accessible via [`ChatError::code()`].
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Invalid or missing configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    ConfigError(String),

    /// Network or HTTP failure on a stream session.
    #[error("[{}] {}", error_codes::TRANSPORT_FAILED, .0)]
    TransportError(String),

    /// A stream session exceeded its deadline.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    TimeoutError(String),

    /// An external data call made for a directive failed.
    #[error("[{}] {}", error_codes::DISPATCH_FAILED, .0)]
    DispatchError(String),

    /// The second generation pass failed after a successful data fetch.
    #[error("[{}] {}", error_codes::SECOND_PASS_FAILED, .0)]
    SecondPassError(String),

    /// Conversation persistence failed.
    #[error("[{}] {}", error_codes::STORAGE_FAILED, .0)]
    StorageError(String),
}

impl ChatError {
    /// Returns the stable error code for this error.
    ///
    /// Codes are SCREAMING_SNAKE_CASE strings that remain stable across releases.
    /// Use these for programmatic error handling rather than parsing Display output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => error_codes::CONFIG_INVALID,
            Self::TransportError(_) => error_codes::TRANSPORT_FAILED,
            Self::TimeoutError(_) => error_codes::TIMEOUT_ERROR,
            Self::DispatchError(_) => error_codes::DISPATCH_FAILED,
            Self::SecondPassError(_) => error_codes::SECOND_PASS_FAILED,
            Self::StorageError(_) => error_codes::STORAGE_FAILED,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::ConfigError(m)
            | Self::TransportError(m)
            | Self::TimeoutError(m)
            | Self::DispatchError(m)
            | Self::SecondPassError(m)
            | Self::StorageError(m) => m,
        }
    }
}

/// Convenience alias for conversation-core results.
pub type Result<T> = std::result::Result<T, ChatError>;
