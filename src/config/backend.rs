//! Backend endpoint configuration

use serde::{Deserialize, Serialize};

/// Location of the edge ML backend the console talks to.
///
/// The liveness probe lives at the server root, every other endpoint is
/// mounted under `api_prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
    /// Client-wide request timeout. Unset means requests may wait indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_seconds: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            api_prefix: "/api".to_string(),
            request_timeout_seconds: None,
        }
    }
}

impl BackendConfig {
    /// `http://host:port`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Absolute URL of an API endpoint, e.g. `api_url("/stream/start")`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url(), self.api_prefix.trim_end_matches('/'), path)
    }

    /// Push channel URL for detection frames.
    pub fn detections_ws_url(&self) -> String {
        format!(
            "ws://{}:{}{}/stream/detections",
            self.host,
            self.port,
            self.api_prefix.trim_end_matches('/')
        )
    }

    /// Video feed reference with a cache-busting timestamp.
    pub fn video_url(&self, timestamp_millis: i64) -> String {
        format!("{}?t={}", self.api_url("/stream/video"), timestamp_millis)
    }
}
