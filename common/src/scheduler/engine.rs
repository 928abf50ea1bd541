// Daily scheduler engine implementation

use crate::config::ScheduleConfig;
use crate::errors::SchedulerError;
use crate::schedule::DailySchedule;
use crate::telemetry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// The daily work callback seam
#[async_trait]
pub trait DailyTask: Send + Sync {
    /// Task name used in logs and metrics
    fn name(&self) -> &str;

    /// Execute one daily run
    async fn run(&self) -> anyhow::Result<()>;
}

/// Scheduler lifecycle operations
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Compute the next fire instant and arm the timer; returns promptly
    async fn start(&self) -> Result<(), SchedulerError>;

    /// Request cooperative cancellation of the armed timer; returns promptly
    async fn stop(&self);
}

/// Observable lifecycle state of the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Constructed, not started
    Idle,
    /// Exactly one timer pending for `next_fire`
    Armed { next_fire: DateTime<Utc> },
    /// Run loop has exited; a later `start` arms a fresh one
    Stopped,
}

/// Single-task daily scheduler.
///
/// Owns the one live timer: a spawned run loop holding one pending sleep at
/// a time. Each fire executes the work callback sequentially, recomputes the
/// next target from the current clock (absorbing DST shifts and clock
/// adjustments) and re-arms.
pub struct DailyScheduler {
    config: ScheduleConfig,
    task: Arc<dyn DailyTask>,
    shutdown_tx: broadcast::Sender<()>,
    runner: Mutex<Option<JoinHandle<()>>>,
    status_tx: watch::Sender<SchedulerStatus>,
    status_rx: watch::Receiver<SchedulerStatus>,
}

impl DailyScheduler {
    /// Create a new scheduler; the zone identifier is resolved at `start`
    pub fn new(config: ScheduleConfig, task: Arc<dyn DailyTask>) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        let (status_tx, status_rx) = watch::channel(SchedulerStatus::Idle);

        Self {
            config,
            task,
            shutdown_tx,
            runner: Mutex::new(None),
            status_tx,
            status_rx,
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> SchedulerStatus {
        self.status_rx.borrow().clone()
    }

    /// Wait for the run loop to terminate after a `stop`
    pub async fn join(&self) {
        let handle = self.runner.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

#[async_trait]
impl Scheduler for DailyScheduler {
    /// Resolve the schedule, compute the first target instant and arm the
    /// timer. An unknown time zone aborts the start; no timer is armed.
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), SchedulerError> {
        let schedule = DailySchedule::from_config(&self.config)?;
        let first_fire = schedule.next_fire(Utc::now())?;

        let mut runner = self.runner.lock().await;
        if let Some(previous) = runner.take() {
            // Re-arming replaces the previous timer, it never adds a second
            warn!("Scheduler already started, replacing the armed timer");
            previous.abort();
        }

        info!(
            timezone = %schedule.timezone(),
            target_time = %schedule.target(),
            next_fire = %first_fire,
            task = self.task.name(),
            "Daily scheduler running"
        );

        let task = self.task.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let status_tx = self.status_tx.clone();
        *runner = Some(tokio::spawn(run_loop(
            schedule,
            task,
            first_fire,
            shutdown_rx,
            status_tx,
        )));

        Ok(())
    }

    /// Disarm the pending timer. A fire that has not started executing is
    /// suppressed; a callback already mid-execution runs to completion.
    /// No-op when nothing is armed.
    #[instrument(skip(self))]
    async fn stop(&self) {
        info!("Daily scheduler stopping");
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for DailyScheduler {
    fn drop(&mut self) {
        // Release the timer on every shutdown path
        if let Some(handle) = self.runner.get_mut().take() {
            handle.abort();
        }
    }
}

/// The armed/fired cycle: sleep until the target instant, run the task,
/// recompute from the current clock, re-arm.
async fn run_loop(
    schedule: DailySchedule,
    task: Arc<dyn DailyTask>,
    first_fire: DateTime<Utc>,
    mut shutdown_rx: broadcast::Receiver<()>,
    status_tx: watch::Sender<SchedulerStatus>,
) {
    let mut next_fire = first_fire;

    loop {
        let _ = status_tx.send(SchedulerStatus::Armed { next_fire });
        let delay = (next_fire - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            // A stop landing while the timer is elapsed but not yet
            // processed must win over the fire
            biased;

            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, disarming timer");
                break;
            }
            _ = sleep(delay) => {
                let run_id = Uuid::new_v4();
                info!(
                    run_id = %run_id,
                    task = task.name(),
                    scheduled_for = %next_fire,
                    "Executing daily task"
                );

                match task.run().await {
                    Ok(()) => {
                        telemetry::record_run_success(task.name());
                        info!(run_id = %run_id, task = task.name(), "Daily task completed");
                    }
                    Err(e) => {
                        // A failed run is reported but still re-arms the
                        // next day's run
                        telemetry::record_run_failure(task.name());
                        error!(run_id = %run_id, task = task.name(), error = %e, "Daily task failed");
                    }
                }

                match schedule.next_fire(Utc::now()) {
                    Ok(instant) => next_fire = instant,
                    Err(e) => {
                        error!(error = %e, "Failed to compute the next fire instant, stopping");
                        break;
                    }
                }
            }
        }
    }

    let _ = status_tx.send(SchedulerStatus::Stopped);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopTask;

    #[async_trait]
    impl DailyTask for NoopTask {
        fn name(&self) -> &str {
            "noop"
        }

        async fn run(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn config(tz: &str) -> ScheduleConfig {
        ScheduleConfig {
            time_zone_id: tz.to_string(),
            hour: 9,
            minute: 0,
        }
    }

    #[test]
    fn test_status_initially_idle() {
        let scheduler = DailyScheduler::new(config("UTC"), Arc::new(NoopTask));
        assert_eq!(scheduler.status(), SchedulerStatus::Idle);
    }

    #[tokio::test]
    async fn test_start_with_unknown_timezone_fails() {
        let scheduler = DailyScheduler::new(config("Not/A_Zone"), Arc::new(NoopTask));
        let result = scheduler.start().await;
        assert!(matches!(
            result,
            Err(SchedulerError::Schedule(
                crate::errors::ScheduleError::InvalidTimezone(_)
            ))
        ));
        // No timer was armed
        assert_eq!(scheduler.status(), SchedulerStatus::Idle);
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let scheduler = DailyScheduler::new(config("UTC"), Arc::new(NoopTask));
        scheduler.stop().await;
        scheduler.stop().await;
        // join with no armed timer returns immediately
        scheduler.join().await;
        assert_eq!(scheduler.status(), SchedulerStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_arms_timer_with_future_instant() {
        let scheduler = DailyScheduler::new(config("UTC"), Arc::new(NoopTask));
        let before = Utc::now();
        scheduler.start().await.expect("start");

        // Let the spawned run loop publish its status
        tokio::time::sleep(Duration::from_millis(10)).await;

        match scheduler.status() {
            SchedulerStatus::Armed { next_fire } => assert!(next_fire > before),
            other => panic!("expected Armed, got {:?}", other),
        }

        scheduler.stop().await;
        scheduler.join().await;
        assert_eq!(scheduler.status(), SchedulerStatus::Stopped);
    }
}
