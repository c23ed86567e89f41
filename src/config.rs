//! Configuration for the conversation core.
//!
//! All connection details come from a single JSON settings document (the
//! client app persists user settings as a JSON key-value record). The
//! configuration is loaded once per conversation and passed by value into
//! the constructors that need it — there is no ambient global state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Top-level configuration for a conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Streaming text-generation endpoint settings.
    pub generation: GenerationConfig,
    /// Attendance REST API settings.
    pub attendance: AttendanceConfig,
    /// Voice-mode settings (consumed by external speech collaborators).
    pub voice: VoiceConfig,
    /// Maximum number of prior messages sent as rolling context.
    pub history_window: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            attendance: AttendanceConfig::default(),
            voice: VoiceConfig::default(),
            history_window: 20,
        }
    }
}

/// Streaming generation endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Hostname or IP of the generation API.
    pub host: String,
    /// TCP port of the generation API.
    pub port: u16,
    /// Path of the streaming completion endpoint.
    pub stream_path: String,
    /// Path of the best-effort stop endpoint.
    pub stop_path: String,
    /// Whole-session deadline in seconds. A stream that has not reached its
    /// terminal event by then is surfaced as a timeout error.
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            stream_path: "/api/generate/stream".to_owned(),
            stop_path: "/api/generate/stream".to_owned(),
            request_timeout_secs: 120,
        }
    }
}

impl GenerationConfig {
    /// Full URL of the streaming endpoint.
    #[must_use]
    pub fn stream_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.stream_path)
    }

    /// Full URL of the stop endpoint.
    #[must_use]
    pub fn stop_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.stop_path)
    }
}

/// Attendance REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Base URL of the attendance service.
    pub base_url: String,
    /// API key sent in the `X-API-KEY` header.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://flask-attendance-api-ymvx.onrender.com".to_owned(),
            api_key: String::new(),
            timeout_secs: 15,
        }
    }
}

/// Voice-mode configuration.
///
/// The speech engines themselves live outside this crate; these values are
/// carried so the embedding application can configure them from one place.
/// `enabled` gates the speak hook fired after a message finalizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Whether finalized assistant messages are handed to the speech sink.
    pub enabled: bool,
    /// Selected synthesis voice.
    pub voice: String,
    /// Selected speech-to-text model.
    pub stt_model: String,
    /// Default language code for speech processing.
    pub language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            voice: "en-US-JennyNeural".to_owned(),
            stt_model: "base.en".to_owned(),
            language: "en".to_owned(),
        }
    }
}

impl AssistantConfig {
    /// Load configuration from a JSON settings document.
    ///
    /// Missing fields fall back to their defaults, so a partial settings
    /// document (only hostnames, say) is valid.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ConfigError`] if the file cannot be read or is
    /// not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatError::ConfigError(format!("failed to read settings {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ChatError::ConfigError(format!("failed to parse settings {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `generation.host` must not be empty
    /// - `generation.request_timeout_secs` must be greater than 0
    /// - `attendance.base_url` must not be empty
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.generation.host.trim().is_empty() {
            return Err(ChatError::ConfigError(
                "generation.host must not be empty".into(),
            ));
        }
        if self.generation.request_timeout_secs == 0 {
            return Err(ChatError::ConfigError(
                "generation.request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.attendance.base_url.trim().is_empty() {
            return Err(ChatError::ConfigError(
                "attendance.base_url must not be empty".into(),
            ));
        }
        Ok(())
    }
}
