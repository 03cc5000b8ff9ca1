//! Txs command implementation

use super::{opt, parse_network_id};
use anyhow::{Context, Result};
use btp_monitor::prelude::*;

pub fn execute(db: &MonitorDb, src: &str, dst: &str) -> Result<()> {
    let src = parse_network_id(src)?;
    let dst = parse_network_id(dst)?;

    let Some(state) = db
        .store()
        .get_connection_state(&src, &dst)
        .context("Failed to read connection state")?
    else {
        println!("No state recorded for {} -> {}", src, dst);
        return Ok(());
    };

    println!("\n{} -> {}", src.address(), dst.address());
    println!("{}", "=".repeat(60));
    println!("State:    {}", state.state);
    println!(
        "Tx:       {} seq={} height={} at={}",
        state.tx_state,
        opt(state.tx_seq),
        opt(state.tx_height),
        opt(state.tx_ts)
    );
    println!(
        "Rx:       {} seq={} height={} at={}",
        state.rx_state,
        opt(state.rx_seq),
        opt(state.rx_height),
        opt(state.rx_ts)
    );

    let Some(id) = state.id else {
        return Ok(());
    };
    let records = db
        .store()
        .get_tx_records(id)
        .context("Failed to read transaction ledger")?;

    println!("\nPending Transactions: {}", records.len());
    let now = Utc::now();
    for record in records {
        let waiting = now.signed_duration_since(record.ts);
        println!(
            "  sn={:<8} seq={:<10} observed={} ({}s ago)",
            record.sn,
            record.seq,
            record.ts.format("%Y-%m-%d %H:%M:%S"),
            waiting.num_seconds()
        );
    }

    Ok(())
}
