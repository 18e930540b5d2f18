//! Configuration for the backend heartbeat.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for backend health checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Whether the heartbeat runs at all
    pub enabled: bool,
    /// Seconds between heartbeats
    pub interval_seconds: u64,
    /// Timeout for the liveness probe request
    pub timeout_seconds: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 30,
            timeout_seconds: 5,
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
