use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use course_core::ProgressRecord;

use crate::repository::{LocalStore, PROGRESS_SLOT, SYNC_KEY_SLOT, StorageError};

use super::SqliteStore;

impl SqliteStore {
    async fn get_slot(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT payload FROM app_state WHERE slot = ?1")
            .bind(slot)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        row.try_get("payload")
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn put_slot(&self, slot: &str, payload: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO app_state (slot, payload, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(slot) DO UPDATE SET
                payload = excluded.payload,
                saved_at = excluded.saved_at
            ",
        )
        .bind(slot)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}

// Best-effort adapter surface: failures are logged and resolved to
// absent/no-op so a broken cache never blocks the caller.
#[async_trait]
impl LocalStore for SqliteStore {
    async fn load_progress(&self) -> Option<ProgressRecord> {
        let payload = match self.get_slot(PROGRESS_SLOT).await {
            Ok(payload) => payload?,
            Err(err) => {
                tracing::warn!(%err, "failed to read cached progress; treating as absent");
                return None;
            }
        };
        match serde_json::from_str(&payload) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(%err, "cached progress is corrupt; treating as absent");
                None
            }
        }
    }

    async fn save_progress(&self, record: &ProgressRecord) {
        let payload = match record.to_json() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(%err, "skipping unserializable progress snapshot");
                return;
            }
        };
        if let Err(err) = self.put_slot(PROGRESS_SLOT, &payload).await {
            tracing::warn!(%err, "failed to persist progress snapshot");
        }
    }

    async fn load_sync_key(&self) -> Option<String> {
        match self.get_slot(SYNC_KEY_SLOT).await {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(%err, "failed to read sync key; treating as absent");
                None
            }
        }
    }

    async fn save_sync_key(&self, key: &str) {
        if let Err(err) = self.put_slot(SYNC_KEY_SLOT, key).await {
            tracing::warn!(%err, "failed to persist sync key");
        }
    }
}
