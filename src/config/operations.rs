//! Timing and defaults for tracked operations

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler timings shared by the console engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationsConfig {
    /// Delay between status polls of a running training or deployment
    pub poll_interval_ms: u64,
    /// Delay before re-checking hub status after a server start request
    pub server_recheck_delay_ms: u64,
    /// Lifetime of a notification before it is dismissed automatically
    pub notification_ttl_ms: u64,
    /// Number of successful uploads kept in the history
    pub upload_history_limit: usize,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            server_recheck_delay_ms: 3000,
            notification_ttl_ms: 5000,
            upload_history_limit: 10,
        }
    }
}

impl OperationsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn server_recheck_delay(&self) -> Duration {
        Duration::from_millis(self.server_recheck_delay_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

/// Parameters sent with every training request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Notebook executed on the hub, relative to the user's home
    pub notebook_path: String,
    /// Execution timeout forwarded to the backend
    pub timeout_seconds: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            notebook_path: "face_recognition_system/train_model.ipynb".to_string(),
            timeout_seconds: 3600,
        }
    }
}

/// Defaults for deployments to the edge device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub model_type: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            model_type: "rf".to_string(),
        }
    }
}
