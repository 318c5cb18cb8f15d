//! Configuration for workflow timing and report requests

use crate::error::Result;
use episteme_utils::{ConfigError, env_var};
use std::time::Duration;

/// Environment variable overriding the report timezone
pub const TIMEZONE_ENV: &str = "EPISTEME_TIMEZONE";

/// Timing and locale settings shared by the workflow components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Period between two task status queries
    pub poll_interval: Duration,

    /// Quiet time after the last keystroke before a search is issued
    pub debounce: Duration,

    /// IANA timezone sent with report requests
    pub timezone: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            debounce: Duration::from_millis(300),
            timezone: "UTC".to_string(),
        }
    }
}

impl FlowConfig {
    /// Create a new configuration builder
    pub fn builder() -> FlowConfigBuilder {
        FlowConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "poll_interval".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.timezone.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "timezone".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for FlowConfig
#[derive(Debug, Default)]
pub struct FlowConfigBuilder {
    poll_interval: Option<Duration>,
    debounce: Option<Duration>,
    timezone: Option<String>,
}

impl FlowConfigBuilder {
    /// Set the status polling period
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the search debounce delay
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    /// Set the report timezone
    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Load the timezone from `EPISTEME_TIMEZONE` when not set explicitly
    pub fn with_env(mut self) -> Self {
        if self.timezone.is_none() {
            self.timezone = env_var(TIMEZONE_ENV);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<FlowConfig> {
        let defaults = FlowConfig::default();

        let config = FlowConfig {
            poll_interval: self.poll_interval.unwrap_or(defaults.poll_interval),
            debounce: self.debounce.unwrap_or(defaults.debounce),
            timezone: self.timezone.unwrap_or(defaults.timezone),
        };

        config.validate()?;
        Ok(config)
    }
}
