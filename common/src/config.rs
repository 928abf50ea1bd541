// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub schedule: ScheduleConfig,
    pub observability: ObservabilityConfig,
}

/// Daily schedule configuration: fire once per day at `hour:minute`
/// wall-clock time in `time_zone_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// IANA time zone identifier, e.g. "Asia/Ho_Chi_Minh"
    pub time_zone_id: String,
    /// Target hour of day, 0-23
    pub hour: u32,
    /// Target minute, 0-59
    pub minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
}

impl Settings {
    /// Load configuration with layered precedence: defaults -> file -> env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment-specific configuration
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    ///
    /// Range checks happen here, before the first scheduling computation;
    /// the time zone identifier itself is resolved when the schedule is
    /// built (see `schedule::DailySchedule::from_config`).
    pub fn validate(&self) -> Result<(), String> {
        if self.schedule.time_zone_id.is_empty() {
            return Err("Schedule time_zone_id cannot be empty".to_string());
        }
        if self.schedule.hour > 23 {
            return Err(format!(
                "Schedule hour must be in 0-23, got {}",
                self.schedule.hour
            ));
        }
        if self.schedule.minute > 59 {
            return Err(format!(
                "Schedule minute must be in 0-59, got {}",
                self.schedule.minute
            ));
        }

        if self.observability.log_level.is_empty() {
            return Err("Observability log_level cannot be empty".to_string());
        }
        if self.observability.metrics_port == 0 {
            return Err("Observability metrics_port must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig {
                time_zone_id: "Asia/Ho_Chi_Minh".to_string(),
                hour: 9,
                minute: 0,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
            },
        }
    }
}
