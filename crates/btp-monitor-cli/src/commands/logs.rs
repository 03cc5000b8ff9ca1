//! Logs command implementation

use anyhow::{Context, Result};
use btp_monitor::prelude::*;

pub fn execute(
    db: &MonitorDb,
    kinds: Vec<LogKind>,
    src: Option<String>,
    dst: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let kinds = if kinds.is_empty() {
        LogKind::ALL.to_vec()
    } else {
        kinds
    };

    let mut query = LogQuery::kinds(&kinds);
    query.src = src;
    query.dst = dst;
    query.limit = limit;

    let entries = db
        .store()
        .query_logs_filtered(&query)
        .context("Failed to query event log")?;

    for entry in &entries {
        let link = if entry.src.is_empty() && entry.dst.is_empty() {
            "*".to_string()
        } else {
            format!("{} -> {}", entry.src, entry.dst)
        };
        let payload =
            serde_json::to_string(&entry.payload).context("Failed to render log payload")?;
        println!(
            "{:>6} {} {:<5} {} {}",
            entry.seq,
            entry.ts.format("%Y-%m-%d %H:%M:%S"),
            entry.kind.as_str(),
            link,
            payload
        );
    }
    tracing::debug!("{} entries", entries.len());

    Ok(())
}
