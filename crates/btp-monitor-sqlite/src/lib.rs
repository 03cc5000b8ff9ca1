//! SQLite-backed monitor state store
//!
//! Persists connection states, the transaction ledger and the event log in
//! one SQLite database, either in memory or in a file.
//!
//! Key features:
//! - Atomic batches on top of `BEGIN IMMEDIATE` transactions
//! - Fair reader/writer gate so polling writes are never starved by readers
//! - Read-only connection pool for parallel reads of file-backed stores
//! - WAL mode for file-backed stores

mod queries;
pub mod read_pool;
pub mod schema;
pub mod store;
pub mod txn;

pub use read_pool::{PooledSqliteConnection, SqliteReadPool};
pub use store::SqliteMonitorStore;
pub use txn::SqliteBatch;
