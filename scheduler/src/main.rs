// Scheduler binary entry point

use common::config::Settings;
use common::scheduler::{DailyScheduler, DailyTask, Scheduler};
use common::telemetry;
use std::sync::Arc;
use tracing::{error, info};

/// The daily work callback installed by this host: one "working" log line
/// per fire.
struct HeartbeatTask;

#[async_trait::async_trait]
impl DailyTask for HeartbeatTask {
    fn name(&self) -> &str {
        "daily-heartbeat"
    }

    async fn run(&self) -> anyhow::Result<()> {
        info!("Timed service is working");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load and validate configuration before anything else; a bad schedule
    // is a fatal configuration error
    let settings = Settings::load()?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(&settings.observability.log_level)?;

    info!("Starting daily task scheduler");

    if let Err(e) = telemetry::init_metrics(settings.observability.metrics_port) {
        error!(error = %e, "Failed to initialize metrics exporter");
        return Err(e);
    }

    info!(
        time_zone_id = %settings.schedule.time_zone_id,
        hour = settings.schedule.hour,
        minute = settings.schedule.minute,
        "Configuration loaded"
    );

    // Create the scheduler engine with the host's work callback
    let scheduler = Arc::new(DailyScheduler::new(
        settings.schedule.clone(),
        Arc::new(HeartbeatTask),
    ));
    info!("Scheduler engine created");

    // Set up graceful shutdown on SIGINT
    let scheduler_for_shutdown = scheduler.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        info!("Received Ctrl+C signal, initiating graceful shutdown");
        scheduler_for_shutdown.stop().await;
    });

    // Arm the first timer; an unknown time zone surfaces here
    if let Err(e) = scheduler.start().await {
        error!(error = %e, "Scheduler failed to start");
        return Err(e.into());
    }

    scheduler.join().await;
    info!("Scheduler stopped");
    Ok(())
}
