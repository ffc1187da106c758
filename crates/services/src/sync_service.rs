//! Progress reconciliation engine: owns the canonical in-memory record,
//! resolves the remote/local/fresh choice at boot, and schedules debounced
//! write-backs.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use course_core::{
    Clock, CourseData, Focus, ImportError, ProgressRecord, StudyPlan, SyncKey, SyncKeyError,
    build_plan,
};
use storage::LocalStore;

use crate::debounce::DebounceTimer;
use crate::error::SyncError;
use crate::remote::RemoteStore;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Whether remote pushes are attempted at all this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Remote sync is active; mutations schedule debounced pushes.
    Remote,
    /// Backend unavailable or unconfigured; mutations persist locally only.
    LocalOnly,
}

/// Human-facing sync status. Rendered through `Display`; the presentation
/// layer never sees a raw transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Adopted the remote record at boot.
    Loaded,
    /// Seeded the remote store from the local copy at boot.
    Initialized,
    /// Remote sync is off for this session.
    LocalOnly,
    /// Boot-time fetch failed; running on the local copy, pushes still on.
    Degraded,
    /// A mutation is waiting out the debounce window.
    Pending,
    /// The last push succeeded.
    Saved,
    /// The last push failed.
    Error(String),
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Loaded => f.write_str("loaded from remote"),
            SyncStatus::Initialized => f.write_str("initialized remote copy"),
            SyncStatus::LocalOnly => f.write_str("local only (remote sync unavailable)"),
            SyncStatus::Degraded => f.write_str("using local copy (remote load failed)"),
            SyncStatus::Pending => f.write_str("waiting to sync"),
            SyncStatus::Saved => f.write_str("saved"),
            SyncStatus::Error(msg) => write!(f, "sync error: {msg}"),
        }
    }
}

/// Completion summary against a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub done: usize,
    pub total: usize,
    pub percent: u8,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// The single owner of the canonical progress record.
///
/// All mutations are serialized through `&mut self`; each one persists
/// locally right away and re-arms the debounce window, so a burst of edits
/// produces one remote write carrying the final state. The snapshot handed to
/// a push is a clone and is never mutated afterwards.
pub struct SyncEngine {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    clock: Clock,
    key: SyncKey,
    record: ProgressRecord,
    mode: SyncMode,
    status: SyncStatus,
    dirty: bool,
    timer: DebounceTimer,
}

impl SyncEngine {
    /// Run the boot sequence: load or generate the sync key, probe the
    /// backend, and resolve the remote/local/fresh three-way choice.
    ///
    /// Never fails; every failure path resolves to a defined mode plus a
    /// status string.
    pub async fn boot(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        clock: Clock,
    ) -> Self {
        let key = match local
            .load_sync_key()
            .await
            .and_then(|raw| SyncKey::parse(&raw).ok())
        {
            Some(key) => key,
            None => {
                // Absent or malformed persisted key: start a fresh identity.
                let key = SyncKey::generate();
                local.save_sync_key(key.as_str()).await;
                key
            }
        };

        let record = ProgressRecord::fresh(clock.now());
        let mut engine = Self {
            local,
            remote,
            clock,
            key,
            record,
            mode: SyncMode::Remote,
            status: SyncStatus::LocalOnly,
            dirty: false,
            timer: DebounceTimer::default(),
        };
        engine.resolve_initial_state().await;
        engine
    }

    async fn resolve_initial_state(&mut self) {
        self.dirty = false;
        self.timer.cancel_if_armed();

        if !self.remote.check_availability().await {
            tracing::debug!("backend unavailable; running local-only");
            self.enter_local_only().await;
            return;
        }

        match self.remote.fetch(&self.key).await {
            Ok(Some(remote_record)) => {
                // Remote is the source of truth when sync is active.
                self.record = remote_record;
                self.local.save_progress(&self.record).await;
                self.mode = SyncMode::Remote;
                self.status = SyncStatus::Loaded;
            }
            Ok(None) => {
                // First use of this key: adopt what we have and seed the
                // remote store with it. Last-writer-wins by design.
                self.adopt_cached_or_default().await;
                self.mode = SyncMode::Remote;
                self.dirty = true;
                let snapshot = self.record.clone();
                self.push_snapshot(&snapshot).await;
                if self.status == SyncStatus::Saved {
                    self.status = SyncStatus::Initialized;
                }
            }
            Err(SyncError::BackendUnconfigured) => {
                tracing::debug!("backend unconfigured; running local-only");
                self.enter_local_only().await;
            }
            Err(err) => {
                // Transient fault: degrade for now but keep pushing later.
                tracing::warn!(%err, "remote fetch failed; adopting local copy");
                self.adopt_cached_or_default().await;
                self.mode = SyncMode::Remote;
                self.status = SyncStatus::Degraded;
            }
        }
    }

    async fn enter_local_only(&mut self) {
        self.adopt_cached_or_default().await;
        self.mode = SyncMode::LocalOnly;
        self.status = SyncStatus::LocalOnly;
        self.timer.cancel_if_armed();
    }

    async fn adopt_cached_or_default(&mut self) {
        self.record = match self.local.load_progress().await {
            Some(cached) => cached,
            None => ProgressRecord::fresh(self.clock.now()),
        };
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Set or clear a lesson's completion flag.
    pub async fn mark_complete(&mut self, lesson_id: &str, done: bool) {
        self.record.mark_complete(lesson_id, done);
        self.commit().await;
    }

    /// Replace a lesson's free-text note.
    pub async fn set_note(&mut self, lesson_id: &str, text: impl Into<String>) {
        self.record.set_note(lesson_id, text);
        self.commit().await;
    }

    /// Replace the study plan.
    pub async fn set_plan(&mut self, plan: StudyPlan) {
        self.record.set_plan(Some(plan));
        self.commit().await;
    }

    /// Build a plan from the full catalog and store it in one step.
    pub async fn build_and_set_plan(
        &mut self,
        catalog: &CourseData,
        hours_per_week: f64,
        focus: Focus,
    ) {
        let plan = build_plan(catalog, hours_per_week, focus, self.clock.now());
        self.record.set_plan(Some(plan));
        self.commit().await;
    }

    /// Replace the record with an externally supplied export, merged over a
    /// fresh default. State is untouched when parsing fails.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` when the payload is not a structured record.
    pub async fn import_record(&mut self, raw: &str) -> Result<(), ImportError> {
        let imported = ProgressRecord::import(raw, self.clock.now())?;
        self.record = imported;
        self.commit().await;
        Ok(())
    }

    /// Every mutation funnels through here: refresh `updated_at`, persist
    /// locally right away, mark dirty, and re-arm the debounce window. In
    /// local-only mode no timer is ever armed.
    async fn commit(&mut self) {
        let now = self.clock.now();
        self.record.touch(now);
        self.local.save_progress(&self.record).await;
        self.dirty = true;
        match self.mode {
            SyncMode::Remote => {
                self.timer.arm(now);
                self.status = SyncStatus::Pending;
            }
            SyncMode::LocalOnly => {
                self.status = SyncStatus::LocalOnly;
            }
        }
    }

    //
    // ─── PUSH PATH ─────────────────────────────────────────────────────────────
    //

    /// Fire the debounced push if its deadline has elapsed. Returns whether a
    /// push was attempted.
    pub async fn tick(&mut self) -> bool {
        if !self.timer.is_due(self.clock.now()) {
            return false;
        }
        self.timer.cancel_if_armed();
        self.sync_now().await;
        true
    }

    /// Push the current record immediately. A no-op when nothing is dirty or
    /// the session is local-only.
    pub async fn sync_now(&mut self) {
        if self.mode == SyncMode::LocalOnly {
            return;
        }
        if !self.dirty {
            return;
        }
        let snapshot = self.record.clone();
        self.push_snapshot(&snapshot).await;
    }

    async fn push_snapshot(&mut self, snapshot: &ProgressRecord) {
        match self.remote.push(&self.key, snapshot).await {
            Ok(()) => {
                self.dirty = false;
                self.status = SyncStatus::Saved;
            }
            Err(SyncError::BackendUnconfigured) => {
                // Permanent for the session; stop arming the timer.
                self.mode = SyncMode::LocalOnly;
                self.status = SyncStatus::LocalOnly;
                self.timer.cancel_if_armed();
            }
            Err(err) => {
                // Dirty stays set; the next mutation re-arms and retries.
                tracing::warn!(%err, "push failed");
                self.status = SyncStatus::Error(err.to_string());
            }
        }
    }

    //
    // ─── IDENTITY ──────────────────────────────────────────────────────────────
    //

    /// Start a new profile under a freshly generated key. The old key and its
    /// remote record stay retrievable; nothing is deleted.
    pub async fn reset_identity(&mut self) {
        let key = SyncKey::generate();
        self.local.save_sync_key(key.as_str()).await;
        self.key = key;

        let fresh = ProgressRecord::fresh(self.clock.now());
        self.local.save_progress(&fresh).await;
        self.record = fresh;

        self.mode = SyncMode::Remote;
        self.resolve_initial_state().await;
    }

    /// Adopt a key pasted from another device and re-run the boot sequence
    /// against it. Invalid keys are rejected before any network call.
    ///
    /// # Errors
    ///
    /// Returns `SyncKeyError` when the trimmed key falls outside the accepted
    /// length bounds.
    pub async fn attach_key(&mut self, raw: &str) -> Result<(), SyncKeyError> {
        let key = SyncKey::parse(raw)?;
        self.local.save_sync_key(key.as_str()).await;
        self.key = key;
        self.mode = SyncMode::Remote;
        self.resolve_initial_state().await;
        Ok(())
    }

    //
    // ─── VIEWS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub fn sync_key(&self) -> &SyncKey {
        &self.key
    }

    #[must_use]
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    #[must_use]
    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// The status as a display string for the presentation layer.
    #[must_use]
    pub fn status_line(&self) -> String {
        self.status.to_string()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// When the next debounced push is due, if one is pending.
    #[must_use]
    pub fn push_deadline(&self) -> Option<DateTime<Utc>> {
        self.timer.deadline()
    }

    /// Pretty-printed record for the export dialog.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error, which stored plans never
    /// trigger in practice.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        self.record.to_json_pretty()
    }

    /// Done/total/percent progress against a catalog. Completed entries for
    /// lessons the catalog no longer carries still count as done.
    #[must_use]
    pub fn completion(&self, catalog: &CourseData) -> Completion {
        let done = self.record.completed_count();
        let total = catalog.lesson_count();
        let percent = if total == 0 {
            0
        } else {
            ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
        };
        Completion {
            done,
            total,
            percent,
        }
    }

    /// Advance a fixed clock by `delta`. Tests drive the debounce window with
    /// this; it has no effect on the system clock.
    pub fn advance_clock(&mut self, delta: Duration) {
        self.clock.advance(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines_are_human_readable() {
        assert_eq!(SyncStatus::Saved.to_string(), "saved");
        assert_eq!(
            SyncStatus::Error("HTTP 500".to_owned()).to_string(),
            "sync error: HTTP 500"
        );
        assert_eq!(
            SyncStatus::LocalOnly.to_string(),
            "local only (remote sync unavailable)"
        );
    }
}
