//! Status command implementation

use anyhow::{Context, Result};
use btp_monitor::prelude::*;

pub fn execute(db: &MonitorDb) -> Result<()> {
    let config = db.store().config();
    let location = config
        .path
        .as_ref()
        .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string());
    tracing::info!("Checking database status: {}", location);

    println!("\nDatabase Status");
    println!("{}", "=".repeat(60));
    println!("Path: {}", location);

    let schema_version = db
        .store()
        .schema_version()
        .context("Failed to get schema version")?;
    println!("Schema Version: {}", schema_version);
    println!("Synchronous: {}", config.synchronous.as_pragma());
    if config.read_pool.enabled {
        println!("Read Pool: {} connections", config.read_pool.pool_size);
    } else {
        println!("Read Pool: disabled");
    }

    let stats = db.store().stats().context("Failed to get table counts")?;
    println!("\nTables:");
    println!("  Connections:     {}", stats.connections);
    println!("  Pending Txs:     {}", stats.tx_records);
    println!("  Log Entries:     {}", stats.log_entries);

    Ok(())
}
