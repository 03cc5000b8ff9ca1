pub mod connection;
pub mod ledger;
pub mod log;
pub mod meta;

pub use connection::{ConnectionId, ConnectionState, LinkRecord};
pub use ledger::{TxRecord, TxSn};
pub use log::{LogEntry, LogKind, LogPayload, LogQuery, Scalar};
pub use meta::StoreStats;
