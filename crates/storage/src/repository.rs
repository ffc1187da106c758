use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use course_core::ProgressRecord;

/// Versioned slot for the cached progress snapshot. The version suffix lets a
/// future schema migrate without colliding with older payloads.
pub const PROGRESS_SLOT: &str = "course-progress-local-v1";

/// Versioned slot for the sync key, kept independent of the snapshot.
pub const SYNC_KEY_SLOT: &str = "course-sync-key-v1";

/// Errors surfaced by storage internals.
///
/// These never cross the [`LocalStore`] boundary: the adapter contract is
/// best-effort, so implementations log and swallow them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Local persistence adapter for the progress snapshot and sync key.
///
/// Best-effort by contract: reads resolve missing *or corrupt* data to
/// `None`, writes are fire-and-forget. Callers never observe a storage
/// failure, so a broken local cache can never block boot.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Load the cached progress snapshot, if one is present and parseable.
    async fn load_progress(&self) -> Option<ProgressRecord>;

    /// Persist the progress snapshot.
    async fn save_progress(&self, record: &ProgressRecord);

    /// Load the raw stored sync key. Validation is the caller's concern.
    async fn load_sync_key(&self) -> Option<String>;

    /// Persist the sync key.
    async fn save_sync_key(&self, key: &str);
}

/// Volatile in-memory store, used by tests and as a fallback when no durable
/// medium is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a cached progress snapshot.
    #[must_use]
    pub fn with_progress(record: &ProgressRecord) -> Self {
        let store = Self::new();
        if let Ok(payload) = record.to_json() {
            store.put(PROGRESS_SLOT, payload);
        }
        store
    }

    /// Write a raw payload into a slot, bypassing serialization. Lets tests
    /// stage corrupt cache contents.
    pub fn put(&self, slot: &str, payload: String) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(slot.to_owned(), payload);
        }
    }

    #[must_use]
    pub fn get(&self, slot: &str) -> Option<String> {
        self.slots.lock().ok()?.get(slot).cloned()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn load_progress(&self) -> Option<ProgressRecord> {
        let payload = self.get(PROGRESS_SLOT)?;
        serde_json::from_str(&payload).ok()
    }

    async fn save_progress(&self, record: &ProgressRecord) {
        match record.to_json() {
            Ok(payload) => self.put(PROGRESS_SLOT, payload),
            Err(err) => tracing::warn!(%err, "skipping unserializable progress snapshot"),
        }
    }

    async fn load_sync_key(&self) -> Option<String> {
        self.get(SYNC_KEY_SLOT)
    }

    async fn save_sync_key(&self, key: &str) {
        self.put(SYNC_KEY_SLOT, key.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::time::fixed_now;

    #[tokio::test]
    async fn memory_store_round_trips_snapshot_and_key() {
        let store = MemoryStore::new();
        assert!(store.load_progress().await.is_none());
        assert!(store.load_sync_key().await.is_none());

        let mut record = ProgressRecord::fresh(fixed_now());
        record.mark_complete("l1", true);
        store.save_progress(&record).await;
        store.save_sync_key("abcdefghij").await;

        assert_eq!(store.load_progress().await, Some(record));
        assert_eq!(store.load_sync_key().await.as_deref(), Some("abcdefghij"));
    }

    #[tokio::test]
    async fn corrupt_snapshot_reads_as_absent() {
        let store = MemoryStore::new();
        store.put(PROGRESS_SLOT, "{not json".to_owned());
        assert!(store.load_progress().await.is_none());
    }
}
