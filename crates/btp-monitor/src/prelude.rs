//! BTP Monitor Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use btp_monitor::prelude::*;
//! ```

// Core types
pub use crate::{
    ConnectionId, ConnectionState, LinkRecord, LogEntry, LogKind, LogPayload, LogQuery,
    MonitorDb, MonitorError, NetworkId, Result, Scalar, StoreStats, TxRecord, TxSn,
};

// Configs
pub use crate::{ReadPoolConfig, StoreConfig, SynchronousMode};

// Traits
pub use crate::{BatchTxn, MonitorRead, MonitorStore};

// Implementations
pub use crate::{SqliteBatch, SqliteMonitorStore};

// Link recording
pub use crate::{record_observation, Recorded, Transition};

// Re-export common external deps
pub use chrono::{DateTime, Utc};
pub use std::sync::Arc;
pub use tracing;
