//! REST client for the attendance service.
//!
//! Thin per-endpoint wrappers over the service's HTTP API. Responses are
//! returned as raw [`serde_json::Value`] — the service's shapes are not
//! uniform, and normalization happens in the dispatcher layer.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::AttendanceConfig;
use crate::error::ChatError;

/// Header carrying the service API key.
const API_KEY_HEADER: &str = "X-API-KEY";

/// Seam over the attendance service.
///
/// The dispatcher depends on this trait rather than on the HTTP client, so
/// the query mapping and normalization are testable without a server.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// `GET /attendance` with optional name and date filters.
    async fn records(
        &self,
        name: Option<&str>,
        date: Option<&str>,
    ) -> Result<serde_json::Value, ChatError>;

    /// `GET /attendance/history` — most recent records for an employee.
    async fn history(&self, name: &str, limit: u32) -> Result<serde_json::Value, ChatError>;

    /// `GET /attendance/{id}` — one record by id.
    async fn record_by_id(&self, id: u64) -> Result<serde_json::Value, ChatError>;

    /// `GET /` — service status probe.
    async fn status(&self) -> Result<serde_json::Value, ChatError>;
}

/// HTTP client for the attendance REST API.
#[derive(Debug, Clone)]
pub struct AttendanceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AttendanceClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ConfigError`] if the HTTP client cannot be built.
    pub fn new(config: &AttendanceConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        })
    }

    /// Issue one authenticated GET and parse the JSON body.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, ChatError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "attendance request");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ChatError::DispatchError(format!("attendance request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::DispatchError(format!(
                "attendance service returned HTTP {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ChatError::DispatchError(format!("attendance response invalid: {e}")))
    }
}

#[async_trait]
impl AttendanceApi for AttendanceClient {
    async fn records(
        &self,
        name: Option<&str>,
        date: Option<&str>,
    ) -> Result<serde_json::Value, ChatError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(name) = name {
            query.push(("name", name));
        }
        if let Some(date) = date {
            query.push(("date", date));
        }
        self.get_json("/attendance", &query).await
    }

    async fn history(&self, name: &str, limit: u32) -> Result<serde_json::Value, ChatError> {
        let limit = limit.to_string();
        self.get_json("/attendance/history", &[("name", name), ("limit", &limit)])
            .await
    }

    async fn record_by_id(&self, id: u64) -> Result<serde_json::Value, ChatError> {
        self.get_json(&format!("/attendance/{id}"), &[]).await
    }

    async fn status(&self) -> Result<serde_json::Value, ChatError> {
        self.get_json("/", &[]).await
    }
}
