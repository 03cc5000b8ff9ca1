//! BTP Monitor Core: Types and traits for the link monitor state store
//!
//! This crate defines the storage-independent pieces of the monitor:
//! - Endpoint identifiers (`NetworkId`) with parsing and address formatting
//! - Record types: connection states, transaction records, log entries
//! - The `MonitorStore` / `BatchTxn` traits implemented by backends
//! - Store configuration and the shared error type
//!
//! Key guarantees expected from every backend:
//! - Batches apply all-or-nothing and surface the caller's error unchanged
//! - Connection identities are stable once allocated
//! - Readers run in parallel; writers are exclusive and never starved

pub mod config;
pub mod error;
pub mod network_id;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::{ReadPoolConfig, StoreConfig, SynchronousMode};
pub use error::{MonitorError, Result};
pub use network_id::NetworkId;
pub use traits::{BatchTxn, MonitorRead, MonitorStore};
pub use types::{
    ConnectionId, ConnectionState, LinkRecord, LogEntry, LogKind, LogPayload, LogQuery, Scalar,
    StoreStats, TxRecord, TxSn,
};
