mod catalog;
mod plan;
mod progress;
mod sync_key;

pub use catalog::{CourseData, CourseLesson, CourseModule};
pub use plan::{Focus, StudyPlan, WeekBucket};
pub use progress::{CompletedSet, ImportError, ProgressRecord};
pub use sync_key::{SyncKey, SyncKeyError};
