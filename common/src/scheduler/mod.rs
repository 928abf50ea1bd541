// Scheduler module: the daily timer engine and its work-callback seam

pub mod engine;

pub use engine::{DailyScheduler, DailyTask, Scheduler, SchedulerStatus};
