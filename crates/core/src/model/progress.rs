use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::model::plan::StudyPlan;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("import payload is not a valid progress record: {0}")]
    Malformed(String),
}

//
// ─── COMPLETED SET ─────────────────────────────────────────────────────────────
//

/// Sparse presence set of completed lesson ids.
///
/// On the wire this is a JSON map `id -> true`; an id is either present (and
/// true) or absent. A `false` entry is never written, and any `false` entries
/// found while deserializing are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedSet(BTreeSet<String>);

impl CompletedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a lesson completed.
    pub fn insert(&mut self, lesson_id: impl Into<String>) {
        self.0.insert(lesson_id.into());
    }

    /// Mark a lesson not completed by removing its entry.
    pub fn remove(&mut self, lesson_id: &str) {
        self.0.remove(lesson_id);
    }

    #[must_use]
    pub fn contains(&self, lesson_id: &str) -> bool {
        self.0.contains(lesson_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Serialize for CompletedSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for id in &self.0 {
            map.serialize_entry(id, &true)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CompletedSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, bool>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .filter_map(|(id, done)| done.then_some(id))
                .collect(),
        ))
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// The complete synchronized state for one sync key.
///
/// A flat, serializable value: completion flags, free-text notes per lesson,
/// and the current study plan. It references the catalog only through lesson
/// id strings, so it tolerates lessons the catalog no longer carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    completed: CompletedSet,
    #[serde(default)]
    notes: BTreeMap<String, String>,
    #[serde(default)]
    plan: Option<StudyPlan>,
    started_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// A fresh record with no progress, created at `now`.
    #[must_use]
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            completed: CompletedSet::new(),
            notes: BTreeMap::new(),
            plan: None,
            started_at: now,
            updated_at: Some(now),
        }
    }

    #[must_use]
    pub fn completed(&self) -> &CompletedSet {
        &self.completed
    }

    #[must_use]
    pub fn is_complete(&self, lesson_id: &str) -> bool {
        self.completed.contains(lesson_id)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    #[must_use]
    pub fn note(&self, lesson_id: &str) -> Option<&str> {
        self.notes.get(lesson_id).map(String::as_str)
    }

    #[must_use]
    pub fn notes(&self) -> &BTreeMap<String, String> {
        &self.notes
    }

    #[must_use]
    pub fn plan(&self) -> Option<&StudyPlan> {
        self.plan.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Set or clear the completion flag for a lesson.
    pub fn mark_complete(&mut self, lesson_id: &str, done: bool) {
        if done {
            self.completed.insert(lesson_id);
        } else {
            self.completed.remove(lesson_id);
        }
    }

    /// Replace the free-text note for a lesson.
    pub fn set_note(&mut self, lesson_id: &str, text: impl Into<String>) {
        self.notes.insert(lesson_id.to_owned(), text.into());
    }

    /// Replace the study plan.
    pub fn set_plan(&mut self, plan: Option<StudyPlan>) {
        self.plan = plan;
    }

    /// Stamp the last-mutation timestamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    /// Serialize the record for export or transmission.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error; only reachable with
    /// non-finite floats in a stored plan, which the planner never produces.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Pretty-printed form used by the export dialog.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ProgressRecord::to_json`].
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse an externally supplied record and merge it over a fresh default.
    ///
    /// Every top-level field is optional, so a partial export is a valid
    /// import; imported fields override the defaults. `updated_at` is always
    /// refreshed to `now`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Malformed` if the payload is not a structured
    /// record; the caller's state is untouched in that case.
    pub fn import(raw: &str, now: DateTime<Utc>) -> Result<Self, ImportError> {
        let patch: RecordPatch =
            serde_json::from_str(raw).map_err(|err| ImportError::Malformed(err.to_string()))?;
        let mut record = Self::fresh(now);
        if let Some(completed) = patch.completed {
            record.completed = completed;
        }
        if let Some(notes) = patch.notes {
            record.notes = notes;
        }
        if let Some(plan) = patch.plan {
            record.plan = Some(plan);
        }
        if let Some(started_at) = patch.started_at {
            record.started_at = started_at;
        }
        record.updated_at = Some(now);
        Ok(record)
    }
}

/// Partial record shape accepted by [`ProgressRecord::import`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordPatch {
    #[serde(default)]
    completed: Option<CompletedSet>,
    #[serde(default)]
    notes: Option<BTreeMap<String, String>>,
    #[serde(default)]
    plan: Option<StudyPlan>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn completed_set_never_serializes_false() {
        let mut record = ProgressRecord::fresh(fixed_now());
        record.mark_complete("l1", true);
        record.mark_complete("l1", false);
        record.mark_complete("l2", true);

        let json = record.to_json().unwrap();
        assert!(json.contains("\"l2\":true"));
        assert!(!json.contains("l1"));
        assert!(!json.contains("false"));
    }

    #[test]
    fn completed_set_drops_false_entries_on_read() {
        let set: CompletedSet =
            serde_json::from_str(r#"{"a": true, "b": false, "c": true}"#).unwrap();
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn mark_complete_is_idempotent() {
        let mut record = ProgressRecord::fresh(fixed_now());
        record.set_note("l1", "keep me");
        record.mark_complete("l1", true);
        record.mark_complete("l1", true);

        assert!(record.is_complete("l1"));
        assert_eq!(record.completed_count(), 1);
        assert_eq!(record.note("l1"), Some("keep me"));
        assert!(record.plan().is_none());
    }

    #[test]
    fn import_round_trips_modulo_updated_at() {
        let started = fixed_now();
        let mut original = ProgressRecord::fresh(started);
        original.mark_complete("l1", true);
        original.set_note("l2", "notes survive");
        original.touch(started + Duration::hours(1));

        let later = started + Duration::days(2);
        let imported = ProgressRecord::import(&original.to_json().unwrap(), later).unwrap();

        assert_eq!(imported.completed(), original.completed());
        assert_eq!(imported.notes(), original.notes());
        assert_eq!(imported.plan(), original.plan());
        assert_eq!(imported.started_at(), original.started_at());
        assert_eq!(imported.updated_at(), Some(later));
    }

    #[test]
    fn partial_import_fills_defaults() {
        let now = fixed_now();
        let imported = ProgressRecord::import(r#"{"notes": {"l1": "only notes"}}"#, now).unwrap();

        assert_eq!(imported.note("l1"), Some("only notes"));
        assert!(imported.completed().is_empty());
        assert!(imported.plan().is_none());
        assert_eq!(imported.started_at(), now);
    }

    #[test]
    fn malformed_import_is_rejected() {
        assert!(ProgressRecord::import("not json", fixed_now()).is_err());
        assert!(ProgressRecord::import("[1, 2, 3]", fixed_now()).is_err());
    }
}
