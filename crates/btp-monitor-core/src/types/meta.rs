use serde::{Deserialize, Serialize};

/// Row counts across the store's tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of links with a recorded connection state
    pub connections: u64,

    /// Number of transaction records currently in the ledger
    pub tx_records: u64,

    /// Number of event log entries
    pub log_entries: u64,
}
