//! Configuration module for the edge console
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`EDGE_CONSOLE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use edge_console::config::ConsoleConfig;
//!
//! let config = ConsoleConfig::default();
//! assert_eq!(config.backend.port, 8080);
//!
//! let toml = r#"
//! [backend]
//! host = "192.168.1.20"
//! "#;
//! let config: ConsoleConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.backend.host, "192.168.1.20");
//! ```

pub mod backend;
pub mod error;
pub mod logging;
pub mod operations;

pub use backend::BackendConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use operations::{DeploymentConfig, OperationsConfig, TrainingConfig};

// Re-export HealthCheckConfig from health module
pub use crate::health::HealthCheckConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the console.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Backend location
    pub backend: BackendConfig,
    /// Health monitor settings
    pub health_check: HealthCheckConfig,
    /// Poll, recheck, and notification timings
    pub operations: OperationsConfig,
    /// Training request parameters
    pub training: TrainingConfig,
    /// Deployment defaults
    pub deployment: DeploymentConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ConsoleConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: p.to_path_buf(),
                    source,
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("EDGE_CONSOLE_HOST") {
            self.backend.host = host;
        }
        if let Ok(port) = std::env::var("EDGE_CONSOLE_PORT") {
            if let Ok(p) = port.parse() {
                self.backend.port = p;
            }
        }
        if let Ok(prefix) = std::env::var("EDGE_CONSOLE_API_PREFIX") {
            self.backend.api_prefix = prefix;
        }

        if let Ok(level) = std::env::var("EDGE_CONSOLE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("EDGE_CONSOLE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(health) = std::env::var("EDGE_CONSOLE_HEALTH_CHECK") {
            self.health_check.enabled = health.to_lowercase() == "true";
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.host.trim().is_empty() {
            return Err(ConfigError::invalid("backend.host", "cannot be empty"));
        }
        if self.backend.port == 0 {
            return Err(ConfigError::invalid("backend.port", "must be non-zero"));
        }
        if !self.backend.api_prefix.is_empty() && !self.backend.api_prefix.starts_with('/') {
            return Err(ConfigError::invalid("backend.api_prefix", "must start with '/'"));
        }

        let intervals = [
            ("health_check.interval_seconds", self.health_check.interval_seconds),
            ("health_check.timeout_seconds", self.health_check.timeout_seconds),
            ("operations.poll_interval_ms", self.operations.poll_interval_ms),
            ("operations.notification_ttl_ms", self.operations.notification_ttl_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be non-zero"));
            }
        }

        if self.deployment.model_type.trim().is_empty() {
            return Err(ConfigError::invalid("deployment.model_type", "cannot be empty"));
        }

        Ok(())
    }
}
