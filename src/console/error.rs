//! Error taxonomy for console operations.

use crate::hub::ApiError;
use thiserror::Error;

/// Why a console operation was rejected or failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsoleError {
    /// Missing or invalid user input, caught before any network call
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Session not ready, or an operation of the same kind is already running
    #[error("{0}")]
    Precondition(String),

    /// Request failed, non-2xx response, or unparseable payload
    #[error(transparent)]
    Transport(#[from] ApiError),

    /// Operation reached the `failed` terminal state
    #[error("{0}")]
    BackendFailure(String),
}

impl ConsoleError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ConsoleError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        ConsoleError::Precondition(message.into())
    }
}
