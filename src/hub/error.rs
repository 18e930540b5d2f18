//! Error types for backend requests.

use thiserror::Error;

/// Errors that can occur while talking to the edge ML backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, reset, etc.
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a non-2xx status. `detail` is the backend's own
    /// explanation when it supplied one.
    #[error("{detail}")]
    Http { status: u16, detail: String },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A local file selected for upload could not be read
    #[error("failed to read {path}: {message}")]
    File { path: String, message: String },
}

impl ApiError {
    /// Classify a reqwest error.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }

    /// Build an HTTP error from a status code and raw response body.
    ///
    /// FastAPI-style bodies carry `{"detail": "..."}`; anything else falls
    /// back to a generic message.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| match v.get("detail") {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(other) if !other.is_null() => Some(other.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| format!("backend returned HTTP {}", status));
        ApiError::Http { status, detail }
    }
}
