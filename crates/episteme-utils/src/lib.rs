//! Shared utilities for episteme
//!
//! This crate provides common functionality used across the episteme workspace,
//! including logging setup and application-level configuration.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError, env_var};
pub use logging::{init_tracing, init_tracing_with};
