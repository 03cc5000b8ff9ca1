pub mod links;
pub mod logs;
pub mod status;
pub mod txs;

use anyhow::{Context, Result};
use btp_monitor::NetworkId;

/// Accept either the canonical `authority-path` form or a `btp://` address
pub(crate) fn parse_network_id(s: &str) -> Result<NetworkId> {
    if s.starts_with("btp://") {
        NetworkId::from_address(s).with_context(|| format!("Invalid address {}", s))
    } else {
        NetworkId::parse(s).with_context(|| format!("Invalid network id {}", s))
    }
}

/// Render an optional value, `-` when absent
pub(crate) fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
