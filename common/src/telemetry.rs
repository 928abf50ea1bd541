// Telemetry module for structured logging and run metrics

use anyhow::Result;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured logging with JSON formatting
///
/// Log levels come from the environment (`RUST_LOG`) when set, falling back
/// to the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_target(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(log_level = log_level, "Structured logging initialized");

    Ok(())
}

/// Initialize the Prometheus metrics exporter and register run counters
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!(
        "task_run_success_total",
        "Total number of successful daily task runs"
    );
    describe_counter!(
        "task_run_failure_total",
        "Total number of failed daily task runs"
    );

    tracing::info!(
        metrics_port = metrics_port,
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

/// Record a successful daily task run
#[inline]
pub fn record_run_success(task_name: &str) {
    counter!("task_run_success_total", "task" => task_name.to_string()).increment(1);
}

/// Record a failed daily task run
#[inline]
pub fn record_run_failure(task_name: &str) {
    counter!("task_run_failure_total", "task" => task_name.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_with_valid_level() {
        // Either succeeds or a subscriber is already installed by another test
        let result = init_logging("info");
        assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn test_metrics_recording_without_exporter() {
        // Recording before an exporter is installed must not panic
        record_run_success("test-task");
        record_run_failure("test-task");
    }
}
