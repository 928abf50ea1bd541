// Error handling framework

use thiserror::Error;

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid time of day {hour:02}:{minute:02} (hour must be 0-23, minute 0-59)")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("Schedule calculation failed: {0}")]
    CalculationFailed(String),
}

/// Scheduler lifecycle errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Scheduler is not running")]
    NotRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_error_display() {
        let err = ScheduleError::InvalidTimezone("Mars/Olympus_Mons".to_string());
        assert_eq!(err.to_string(), "Invalid timezone: Mars/Olympus_Mons");

        let err = ScheduleError::InvalidTime { hour: 25, minute: 0 };
        assert!(err.to_string().contains("25:00"));
    }

    #[test]
    fn test_scheduler_error_from_schedule_error() {
        let err: SchedulerError = ScheduleError::InvalidTimezone("bad".to_string()).into();
        assert!(matches!(err, SchedulerError::Schedule(_)));
    }
}
