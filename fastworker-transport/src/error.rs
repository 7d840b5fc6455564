//! # Transport Errors

use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("peer closed the connection")]
    PeerClosed,

    #[error("not connected")]
    NotConnected,

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl TransportError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NotConnected)
    }
}
