//! # Error Types
//!
//! Unified error handling shared by every role in the system.

use thiserror::Error;

/// Crate-wide result type.
pub type FastworkerResult<T> = Result<T, FastworkerError>;

/// Errors surfaced by the dispatch core.
#[derive(Debug, Error)]
pub enum FastworkerError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("timed out waiting for {operation}")]
    Timeout { operation: String },

    #[error("task {name} not found in registry")]
    TaskNotFound { name: String },

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no active subworker available")]
    NoSubworkerAvailable,

    #[error("{0}")]
    Other(String),
}

impl FastworkerError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage(message.into())
    }

    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Whether a client-side retry is worth attempting for this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::NoSubworkerAvailable
        )
    }
}
