use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use course_core::{Clock, CourseData};
use storage::sqlite::SqliteStore;

use crate::error::AppServicesError;
use crate::remote::{HttpRemote, HttpRemoteConfig, NullRemote, RemoteStore};
use crate::sync_service::SyncEngine;

/// How often the driver task checks for a due debounce deadline.
const DRIVER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Assembles storage, the remote client, and a booted engine.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CourseData>,
    engine: Arc<Mutex<SyncEngine>>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, booting the engine against
    /// the configured remote (or none, which means local-only).
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the
    /// course dataset does not parse.
    pub async fn new_sqlite(
        db_url: &str,
        remote_config: Option<HttpRemoteConfig>,
        catalog_json: &str,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let store = SqliteStore::connect(db_url).await?;
        store.migrate().await?;

        let catalog = Arc::new(CourseData::from_json(catalog_json)?);
        let remote: Arc<dyn RemoteStore> = match remote_config {
            Some(config) => Arc::new(HttpRemote::new(config)),
            None => Arc::new(NullRemote),
        };

        let engine = SyncEngine::boot(Arc::new(store), remote, clock).await;
        Ok(Self {
            catalog,
            engine: Arc::new(Mutex::new(engine)),
        })
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CourseData> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn engine(&self) -> Arc<Mutex<SyncEngine>> {
        Arc::clone(&self.engine)
    }

    /// Spawn the task that fires due debounce deadlines on wall-clock time.
    /// Tests drive `SyncEngine::tick` directly on a fixed clock instead.
    #[must_use]
    pub fn spawn_sync_driver(&self) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(DRIVER_POLL_INTERVAL);
            loop {
                interval.tick().await;
                engine.lock().await.tick().await;
            }
        })
    }
}
