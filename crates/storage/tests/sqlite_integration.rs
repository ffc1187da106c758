use course_core::ProgressRecord;
use course_core::time::fixed_now;
use storage::repository::{LocalStore, PROGRESS_SLOT};
use storage::sqlite::SqliteStore;

async fn connect(name: &str) -> SqliteStore {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let store = SqliteStore::connect(&url).await.expect("connect");
    store.migrate().await.expect("migrate");
    store
}

#[tokio::test]
async fn sqlite_round_trips_snapshot_and_key() {
    let store = connect("memdb_roundtrip").await;

    assert!(store.load_progress().await.is_none());
    assert!(store.load_sync_key().await.is_none());

    let mut record = ProgressRecord::fresh(fixed_now());
    record.mark_complete("lesson-1", true);
    record.set_note("lesson-2", "revisit the webhook example");

    store.save_progress(&record).await;
    store.save_sync_key("0123456789abcdef").await;

    let loaded = store.load_progress().await.expect("snapshot present");
    assert_eq!(loaded, record);
    assert_eq!(
        store.load_sync_key().await.as_deref(),
        Some("0123456789abcdef")
    );
}

#[tokio::test]
async fn sqlite_overwrites_snapshot_in_place() {
    let store = connect("memdb_overwrite").await;

    let mut record = ProgressRecord::fresh(fixed_now());
    store.save_progress(&record).await;

    record.mark_complete("lesson-1", true);
    store.save_progress(&record).await;

    let loaded = store.load_progress().await.expect("snapshot present");
    assert!(loaded.is_complete("lesson-1"));
}

#[tokio::test]
async fn corrupt_snapshot_reads_as_absent() {
    let store = connect("memdb_corrupt").await;

    sqlx::query("INSERT INTO app_state (slot, payload, saved_at) VALUES (?1, ?2, ?3)")
        .bind(PROGRESS_SLOT)
        .bind("{definitely not a record")
        .bind(fixed_now())
        .execute(store.pool())
        .await
        .expect("seed corrupt payload");

    assert!(store.load_progress().await.is_none());
}
