// Common library for shared code across the scheduler binary and tests

pub mod config;
pub mod errors;
pub mod schedule;
pub mod scheduler;
pub mod telemetry;
