//! Hub session state machine.
//!
//! `Disconnected → Connecting → Connected | Error`, and both `Connected` and
//! `Error` may re-enter `Connecting`. Each connect attempt gets a number so a
//! late response for an abandoned attempt is never applied.

use crate::console::ConsoleError;
use crate::hub::{ApiError, UserInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable hub connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Hub session: status, identity, and the credential held in memory.
#[derive(Debug, Default)]
pub struct Session {
    status: ConnectionStatus,
    user: Option<UserInfo>,
    token: Option<String>,
    pending_token: Option<String>,
    attempt: u64,
    last_error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The credential that authenticated the current session.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// True iff the session is `Connected`.
    pub fn is_ready(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Gate for upload, training, and deployment.
    pub fn require_ready(&self) -> Result<(), ConsoleError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ConsoleError::precondition(
                "Please connect to JupyterHub first",
            ))
        }
    }

    /// Validate the token and enter `Connecting`. Returns the attempt number
    /// the authenticate response must carry.
    pub fn begin_connect(&mut self, token: &str) -> Result<u64, ConsoleError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ConsoleError::validation(
                "token",
                "Please enter JupyterHub API token",
            ));
        }

        self.attempt += 1;
        self.status = ConnectionStatus::Connecting;
        self.pending_token = Some(token.to_string());
        self.last_error = None;
        Ok(self.attempt)
    }

    /// Apply the authenticate response for `attempt`.
    ///
    /// Returns `None` when the attempt was superseded and the result discarded.
    pub fn complete_connect(
        &mut self,
        attempt: u64,
        result: Result<UserInfo, ApiError>,
    ) -> Option<Result<UserInfo, ApiError>> {
        if attempt != self.attempt || self.status != ConnectionStatus::Connecting {
            tracing::debug!(attempt, current = self.attempt, "Discarding stale connect result");
            return None;
        }

        match &result {
            Ok(user) => {
                self.status = ConnectionStatus::Connected;
                self.user = Some(user.clone());
                self.token = self.pending_token.take();
                tracing::info!(user = %user.name, server_running = user.server_running, "Hub session connected");
            }
            Err(e) => {
                self.status = ConnectionStatus::Error;
                self.user = None;
                self.token = None;
                self.pending_token = None;
                self.last_error = Some(e.to_string());
                tracing::warn!(error = %e, "Hub connection failed");
            }
        }
        Some(result)
    }

    /// Replace the stored identity after a status re-check.
    pub fn refresh_user(&mut self, user: UserInfo) {
        if self.is_ready() {
            self.user = Some(user);
        }
    }

    /// Forget the credential and identity.
    pub fn disconnect(&mut self) {
        self.attempt += 1;
        self.status = ConnectionStatus::Disconnected;
        self.user = None;
        self.token = None;
        self.pending_token = None;
        self.last_error = None;
    }
}
