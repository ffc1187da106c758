//! Remote sync client: GET/PUT of the whole progress record against a
//! key-value backend, authenticated by the sync key alone.

use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use course_core::{ProgressRecord, SyncKey};

use crate::error::SyncError;

/// Upper bound on the serialized record accepted for a push, checked before
/// transmission to bound request size and remote storage cost.
pub const MAX_SERIALIZED_CHARS: usize = 500_000;

/// Header carrying the bearer key on every authenticated call.
const SYNC_KEY_HEADER: &str = "x-sync-key";

/// Remote progress endpoint consumed by the reconciliation engine.
///
/// GET has no side effects and PUT replaces the record wholesale, so every
/// call is idempotent from the server's perspective. No partial writes exist.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Probe whether the backend is configured. Unreachable means
    /// unavailable; this never fails.
    async fn check_availability(&self) -> bool;

    /// Fetch the record stored under `key`, `None` when the key has never
    /// been written.
    async fn fetch(&self, key: &SyncKey) -> Result<Option<ProgressRecord>, SyncError>;

    /// Replace the record stored under `key` with `record`.
    async fn push(&self, key: &SyncKey, record: &ProgressRecord) -> Result<(), SyncError>;
}

/// Serialize a record for transmission, enforcing the payload bound.
///
/// # Errors
///
/// `PayloadTooLarge` when the serialized form exceeds
/// [`MAX_SERIALIZED_CHARS`]; `Transient` when serialization itself fails.
pub fn serialized_form(record: &ProgressRecord) -> Result<String, SyncError> {
    let body = record
        .to_json()
        .map_err(|err| SyncError::Transient(err.to_string()))?;
    if body.chars().count() > MAX_SERIALIZED_CHARS {
        return Err(SyncError::PayloadTooLarge);
    }
    Ok(body)
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct HttpRemoteConfig {
    pub base_url: String,
}

impl HttpRemoteConfig {
    /// Read the backend base URL from `COURSE_SYNC_BASE_URL`.
    ///
    /// Absent, empty, or unparseable values yield `None`: the app then runs
    /// local-only instead of failing to start.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let raw = env::var("COURSE_SYNC_BASE_URL").ok()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() || Url::parse(trimmed).is_err() {
            return None;
        }
        Some(Self {
            base_url: trimmed.to_owned(),
        })
    }
}

/// reqwest-backed [`RemoteStore`] speaking the progress wire contract.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    #[must_use]
    pub fn new(config: HttpRemoteConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    fn classify(status: StatusCode) -> SyncError {
        match status {
            StatusCode::UNAUTHORIZED => SyncError::Unauthorized,
            StatusCode::NOT_IMPLEMENTED => SyncError::BackendUnconfigured,
            StatusCode::PAYLOAD_TOO_LARGE => SyncError::PayloadTooLarge,
            other => SyncError::Transient(format!("HTTP {other}")),
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn check_availability(&self) -> bool {
        let response = match self.client.get(self.endpoint("health")).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(%err, "health probe unreachable");
                return false;
            }
        };
        if !response.status().is_success() {
            return false;
        }
        match response.json::<HealthResponse>().await {
            Ok(health) => health.kv_configured,
            Err(err) => {
                tracing::debug!(%err, "health probe returned an unexpected body");
                false
            }
        }
    }

    async fn fetch(&self, key: &SyncKey) -> Result<Option<ProgressRecord>, SyncError> {
        let response = self
            .client
            .get(self.endpoint("progress"))
            .header(SYNC_KEY_HEADER, key.as_str())
            .send()
            .await
            .map_err(|err| SyncError::Transient(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify(status));
        }

        let body: FetchResponse = response
            .json()
            .await
            .map_err(|err| SyncError::Transient(err.to_string()))?;

        // A present but structurally invalid remote record reads as absent;
        // the engine then re-seeds from the local cache.
        Ok(body.progress.and_then(|value| {
            match serde_json::from_value::<ProgressRecord>(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(%err, "remote record is malformed; treating as absent");
                    None
                }
            }
        }))
    }

    async fn push(&self, key: &SyncKey, record: &ProgressRecord) -> Result<(), SyncError> {
        // Enforced client-side, ahead of transmission.
        serialized_form(record)?;

        let response = self
            .client
            .put(self.endpoint("progress"))
            .header(SYNC_KEY_HEADER, key.as_str())
            .json(&PushRequest { progress: record })
            .send()
            .await
            .map_err(|err| SyncError::Transient(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify(status));
        }
        Ok(())
    }
}

/// Stand-in used when no backend is configured; always unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRemote;

#[async_trait]
impl RemoteStore for NullRemote {
    async fn check_availability(&self) -> bool {
        false
    }

    async fn fetch(&self, _key: &SyncKey) -> Result<Option<ProgressRecord>, SyncError> {
        Err(SyncError::BackendUnconfigured)
    }

    async fn push(&self, _key: &SyncKey, _record: &ProgressRecord) -> Result<(), SyncError> {
        Err(SyncError::BackendUnconfigured)
    }
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(rename = "kvConfigured", default)]
    kv_configured: bool,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    progress: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    progress: &'a ProgressRecord,
}
