//! Links command implementation

use super::opt;
use anyhow::{Context, Result};
use btp_monitor::prelude::*;

pub fn execute(db: &MonitorDb) -> Result<()> {
    let links = db
        .store()
        .list_connection_states()
        .context("Failed to list links")?;

    if links.is_empty() {
        println!("No links recorded");
        return Ok(());
    }

    println!(
        "{:>4}  {:<40} {:<40} {:<10} {:>10} {:>10} {:>8}",
        "ID", "SRC", "DST", "STATE", "TX SEQ", "RX SEQ", "PENDING"
    );
    for link in links {
        let id = link.state.id.unwrap_or_default();
        let pending = db
            .store()
            .count_tx_records(id)
            .with_context(|| format!("Failed to count transactions of link {}", id))?;
        println!(
            "{:>4}  {:<40} {:<40} {:<10} {:>10} {:>10} {:>8}",
            id,
            link.src,
            link.dst,
            link.state.state,
            opt(link.state.tx_seq),
            opt(link.state.rx_seq),
            pending
        );
    }

    Ok(())
}
