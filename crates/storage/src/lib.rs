#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{LocalStore, MemoryStore, PROGRESS_SLOT, SYNC_KEY_SLOT, StorageError};
pub use sqlite::{SqliteInitError, SqliteStore};
