//! Configuration for the service client

use crate::error::Result;
use crate::retry::RetryPolicy;
use episteme_utils::{ConfigError, env_var};
use std::time::Duration;
use tracing::warn;

/// Environment variable holding the service base URL
pub const BASE_URL_ENV: &str = "EPISTEME_API_BASE_URL";
/// Environment variable holding the API key sent with every request
pub const API_KEY_ENV: &str = "EPISTEME_API_KEY";
/// Environment variable overriding the request timeout, in seconds
pub const TIMEOUT_ENV: &str = "EPISTEME_REQUEST_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpApiClient`](crate::HttpApiClient)
///
/// Base URL and API key are optional on purpose: a client built without them
/// still starts, and every call then fails through the normal error path.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Service base URL, e.g. `https://api.example.com/`
    pub base_url: Option<String>,

    /// Value of the `X-API-Key` header
    pub api_key: Option<String>,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Retry policy for transport failures (no retries by default)
    pub retry: RetryPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::no_retry(),
        }
    }
}

impl ApiConfig {
    /// Create a new configuration builder
    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::default()
    }

    /// Load settings from `EPISTEME_API_BASE_URL`, `EPISTEME_API_KEY` and
    /// `EPISTEME_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env().build()
    }

    /// Names of required settings that are absent
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.base_url.is_none() {
            missing.push(BASE_URL_ENV);
        }
        if self.api_key.is_none() {
            missing.push(API_KEY_ENV);
        }
        missing
    }

    /// Log a warning for every missing required setting
    pub fn warn_if_incomplete(&self) -> bool {
        let missing = self.missing_settings();
        for key in &missing {
            warn!("{key} is not set; requests to the analysis service will fail");
        }
        missing.is_empty()
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url).map_err(|e| ConfigError::Invalid {
                key: BASE_URL_ENV.to_string(),
                reason: e.to_string(),
            })?;
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "request_timeout".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "retry.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for ApiConfig
#[derive(Debug, Default)]
pub struct ApiConfigBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    request_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    invalid_timeout: Option<String>,
}

impl ApiConfigBuilder {
    /// Set the service base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the transport retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Fill unset values from the environment
    pub fn with_env(mut self) -> Self {
        if self.base_url.is_none() {
            self.base_url = env_var(BASE_URL_ENV);
        }
        if self.api_key.is_none() {
            self.api_key = env_var(API_KEY_ENV);
        }
        if self.request_timeout.is_none() {
            if let Some(raw) = env_var(TIMEOUT_ENV) {
                match raw.parse::<u64>() {
                    Ok(secs) => self.request_timeout = Some(Duration::from_secs(secs)),
                    Err(_) => self.invalid_timeout = Some(raw),
                }
            }
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ApiConfig> {
        if let Some(raw) = self.invalid_timeout {
            return Err(ConfigError::Invalid {
                key: TIMEOUT_ENV.to_string(),
                reason: format!("'{raw}' is not a number of seconds"),
            }
            .into());
        }

        let defaults = ApiConfig::default();
        let config = ApiConfig {
            base_url: self.base_url.filter(|url| !url.trim().is_empty()),
            api_key: self.api_key.filter(|key| !key.trim().is_empty()),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            retry: self.retry.unwrap_or(defaults.retry),
        };

        config.validate()?;
        Ok(config)
    }
}
