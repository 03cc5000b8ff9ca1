use crate::types::ConnectionId;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid network id {value:?}: {reason}")]
    Decode { value: String, reason: String },

    #[error("SQLite error: {0}")]
    Sqlite(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// The calling thread already holds the store's write gate.
    #[error("Store accessed re-entrantly from inside a batch")]
    ReentrantAccess,

    /// Rolling back a failed batch itself failed. The store is poisoned.
    #[error("Rollback failed: {0}")]
    RollbackFailed(String),

    #[error("Store is poisoned after a failed rollback")]
    Poisoned,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl MonitorError {
    pub fn decode(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// True for errors after which the store can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RollbackFailed(_) | Self::Poisoned)
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

// Batch closures may return their own error type. Any type implementing
// `From<MonitorError>` works, so application errors usually carry a
// transparent variant:
//
// #[derive(Error, Debug)]
// pub enum PollerError {
//     #[error("RPC error: {0}")]
//     Rpc(String),
//
//     #[error(transparent)]
//     Store(#[from] MonitorError),
// }
