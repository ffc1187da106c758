//! Shared error types for the services crate.

use thiserror::Error;

use storage::sqlite::SqliteInitError;

use crate::remote::MAX_SERIALIZED_CHARS;

/// Failure kinds of the remote sync endpoint, as seen by the engine.
///
/// Every transport or server fault is converted to one of these at the remote
/// client boundary; nothing rawer ever reaches the presentation layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncError {
    /// The server rejected the sync key. Never auto-retried.
    #[error("sync key rejected by the server")]
    Unauthorized,

    /// The remote store has no configured credentials. Permanent for the
    /// session; the engine falls back to local-only mode.
    #[error("remote store is not configured")]
    BackendUnconfigured,

    /// The serialized record exceeds the remote payload bound. The write is
    /// dropped; the local copy is retained.
    #[error("progress snapshot exceeds {MAX_SERIALIZED_CHARS} serialized characters")]
    PayloadTooLarge,

    /// Network or server fault. The next debounced mutation retries.
    #[error("sync request failed: {0}")]
    Transient(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error("course dataset failed to parse: {0}")]
    Catalog(#[from] serde_json::Error),
}
