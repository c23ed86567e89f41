//! Filesystem-backed conversation persistence.
//!
//! The full ordered message list is written through to one JSON document
//! under a single key-file. Writes are atomic (temp file + fsync + rename)
//! to prevent corruption on crash.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chat::message::ChatMessage;
use crate::error::ChatError;

/// Bump when the persisted envelope changes shape.
const CURRENT_SCHEMA_VERSION: u32 = 1;

/// File name of the single persisted conversation document.
const MESSAGES_FILE: &str = "messages.json";

/// On-disk envelope around the message list.
#[derive(Debug, Serialize, Deserialize)]
struct StoredConversation {
    schema_version: u32,
    messages: Vec<ChatMessage>,
}

/// Filesystem-backed message store.
///
/// One store per conversation; the document lives at
/// `{data_dir}/messages.json`.
#[derive(Debug, Clone)]
pub struct MessageStore {
    data_dir: PathBuf,
}

impl MessageStore {
    /// Create a store rooted at `data_dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StorageError`] if the directory cannot be
    /// created.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, ChatError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            ChatError::StorageError(format!(
                "failed to create data directory {}: {e}",
                data_dir.display()
            ))
        })?;
        Ok(Self { data_dir })
    }

    /// Create a store in the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StorageError`] if no platform data directory is
    /// available or it cannot be created.
    pub fn open_default() -> Result<Self, ChatError> {
        let base = dirs::data_dir()
            .ok_or_else(|| ChatError::StorageError("no platform data directory".into()))?;
        Self::new(base.join("palaver"))
    }

    /// Returns the data directory path.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn document_path(&self) -> PathBuf {
        self.data_dir.join(MESSAGES_FILE)
    }

    /// Load the persisted message list.
    ///
    /// A missing document is an empty conversation. Streaming flags are
    /// cleared on load — nothing can be in flight across a restart.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StorageError`] if the document exists but
    /// cannot be read or parsed.
    pub async fn load(&self) -> Result<Vec<ChatMessage>, ChatError> {
        let path = self.document_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ChatError::StorageError(format!("failed to read {}: {e}", path.display()))
        })?;
        let stored: StoredConversation = serde_json::from_str(&content).map_err(|e| {
            ChatError::StorageError(format!("failed to parse {}: {e}", path.display()))
        })?;

        let mut messages = stored.messages;
        for message in &mut messages {
            if message.is_streaming {
                tracing::warn!(id = %message.id, "clearing stale streaming flag on load");
                message.is_streaming = false;
            }
        }
        Ok(messages)
    }

    /// Persist the full message list atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StorageError`] on any filesystem failure.
    pub async fn save(&self, messages: &[ChatMessage]) -> Result<(), ChatError> {
        let stored = StoredConversation {
            schema_version: CURRENT_SCHEMA_VERSION,
            messages: messages.to_vec(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|e| {
            ChatError::StorageError(format!("failed to serialize conversation: {e}"))
        })?;

        let path = self.document_path();
        let tmp_path = self.data_dir.join(format!(".{MESSAGES_FILE}.tmp"));
        tokio::fs::write(&tmp_path, json.as_bytes()).await.map_err(|e| {
            ChatError::StorageError(format!(
                "failed to write temp file {}: {e}",
                tmp_path.display()
            ))
        })?;

        // fsync before the rename so the rename never publishes a torn file
        if let Ok(file) = std::fs::File::open(&tmp_path) {
            let _ = file.sync_all();
        }

        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            ChatError::StorageError(format!(
                "failed to rename temp file to {}: {e}",
                path.display()
            ))
        })?;

        Ok(())
    }
}
