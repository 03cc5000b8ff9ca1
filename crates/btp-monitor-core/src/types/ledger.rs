use crate::types::ConnectionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ledger-wide transaction sequence number
pub type TxSn = i64;

/// One observed transaction on a link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Unique across the whole ledger, not per connection
    pub sn: TxSn,

    /// Connection this observation belongs to
    pub connection_id: ConnectionId,

    /// Observed BTP message sequence
    pub seq: u64,

    /// When the transaction was observed
    pub ts: DateTime<Utc>,
}
