#![forbid(unsafe_code)]

pub mod model;
pub mod planner;
pub mod time;

pub use time::Clock;

pub use model::{
    CompletedSet, CourseData, CourseLesson, CourseModule, Focus, ImportError, ProgressRecord,
    StudyPlan, SyncKey, SyncKeyError, WeekBucket,
};
pub use planner::{DEFAULT_LESSON_MINUTES, MIN_WEEKLY_MINUTES, build_plan};
