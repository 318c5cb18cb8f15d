//! Application-level configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = ".episteme";

/// Errors raised while assembling configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting is present but unusable
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Directory holding locally persisted state (favorites)
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "episteme".to_string(),
            environment: "development".to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl Config {
    /// Build from `EPISTEME_ENV` and `EPISTEME_DATA_DIR`, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            environment: env_var("EPISTEME_ENV").unwrap_or(defaults.environment),
            data_dir: env_var("EPISTEME_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            ..defaults
        }
    }

    /// Path of the favorites file inside the data directory
    pub fn favorites_path(&self) -> PathBuf {
        self.data_dir.join("favorites.json")
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "prod" | "production")
    }
}

/// Read an environment variable, treating blank values as unset
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
