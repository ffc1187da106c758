#![forbid(unsafe_code)]

pub mod app_services;
pub mod debounce;
pub mod error;
pub mod remote;
pub mod sync_service;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use debounce::{DEBOUNCE_DELAY_MS, DebounceTimer};
pub use error::{AppServicesError, SyncError};
pub use remote::{HttpRemote, HttpRemoteConfig, NullRemote, RemoteStore};
pub use sync_service::{Completion, SyncEngine, SyncMode, SyncStatus};
