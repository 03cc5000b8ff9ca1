use crate::network_id::NetworkId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identity of a connection state row
///
/// Allocated on the first write for a `(src, dst)` pair and never reused.
pub type ConnectionId = i64;

/// Last observed status of one directional link
///
/// State labels are opaque to the store; the monitor decides what they mean
/// (`"unknown"`, `"online"`, `"bad"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    /// Identity assigned by the store. Ignored on write when a row exists.
    pub id: Option<ConnectionId>,

    /// Overall link state
    pub state: String,

    pub tx_state: String,
    pub tx_seq: Option<u64>,
    pub tx_ts: Option<DateTime<Utc>>,
    pub tx_height: Option<u64>,

    pub rx_state: String,
    pub rx_seq: Option<u64>,
    pub rx_ts: Option<DateTime<Utc>>,
    pub rx_height: Option<u64>,
}

impl ConnectionState {
    /// A state with every label set to `label` and no counters
    pub fn with_label(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: None,
            state: label.clone(),
            tx_state: label.clone(),
            tx_seq: None,
            tx_ts: None,
            tx_height: None,
            rx_state: label,
            rx_seq: None,
            rx_ts: None,
            rx_height: None,
        }
    }

    /// Same record with the identity replaced
    pub fn with_id(mut self, id: ConnectionId) -> Self {
        self.id = Some(id);
        self
    }

    /// Compare everything except the identity
    pub fn same_observation(&self, other: &ConnectionState) -> bool {
        let mut a = self.clone();
        a.id = other.id;
        &a == other
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::with_label("unknown")
    }
}

/// A stored link together with its current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub src: NetworkId,
    pub dst: NetworkId,
    pub state: ConnectionState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_observation_ignores_identity() {
        let a = ConnectionState::with_label("online").with_id(3);
        let b = ConnectionState::with_label("online");
        assert!(a.same_observation(&b));
        assert_ne!(a, b);

        let mut c = b.clone();
        c.tx_seq = Some(1);
        assert!(!a.same_observation(&c));
    }
}
