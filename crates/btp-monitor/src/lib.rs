//! BTP Monitor: transactional local state for a cross-chain link monitor
//!
//! The store remembers, across polling cycles:
//! - **Connection states**: last observed status of every directional link
//! - **Transaction ledger**: observed, not yet settled transactions per link
//! - **Event log**: a kind-tagged diagnostic trail
//!
//! Mutations made inside one batch commit or roll back together.
//!
//! # Quick Start
//!
//! ```no_run
//! use btp_monitor::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let db = MonitorDb::open("./monitor.db")?;
//! let src = NetworkId::from_address("btp://0x1.icon/cx0001")?;
//! let dst = NetworkId::from_address("btp://0x2.eth2/0xabcd")?;
//!
//! // State change and its evidence commit atomically
//! db.store().run_batch(|batch| {
//!     let stored = batch.set_connection_state(&src, &dst, &ConnectionState::with_label("online"))?;
//!     batch.add_tx_record(stored.id.unwrap_or_default(), 12, chrono::Utc::now())?;
//!     Ok::<_, MonitorError>(())
//! })?;
//!
//! let state = db.store().get_connection_state(&src, &dst)?;
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod prelude;
pub mod recorder;

// Re-export core types
pub use btp_monitor_core::{
    config::{ReadPoolConfig, StoreConfig, SynchronousMode},
    error::{MonitorError, Result},
    traits::{BatchTxn, MonitorRead, MonitorStore},
    types::{
        ConnectionId, ConnectionState, LinkRecord, LogEntry, LogKind, LogPayload, LogQuery,
        Scalar, StoreStats, TxRecord, TxSn,
    },
    NetworkId,
};

// Re-export implementations
pub use btp_monitor_sqlite::{SqliteBatch, SqliteMonitorStore};

// Re-export main types from this crate
pub use db::MonitorDb;
pub use recorder::{record_observation, Recorded, Transition};
