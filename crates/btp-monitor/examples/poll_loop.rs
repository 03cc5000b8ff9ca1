//! Polling loop example
//!
//! Simulates a few polling cycles of one link and shows:
//! - Recording an observation (state, new transactions, settlement) atomically
//! - Reacting to state transitions
//! - Reading the event log back
//!
//! Run with: cargo run --example poll_loop

use btp_monitor::prelude::*;
use chrono::Duration;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("btp_monitor=debug")
        .init();

    let temp_dir = tempfile::tempdir()?;
    let db = MonitorDb::open(temp_dir.path().join("monitor.db"))?;

    let src = NetworkId::from_address("btp://0x7.icon/cx0000000000000000000000000000000000000001")?;
    let dst = NetworkId::from_address("btp://0xaa36a7.eth2/0x0000000000000000000000000000000000000002")?;

    // (status, highest sent seq, highest received seq, new tx seqs)
    let cycles: [(&str, u64, u64, &[u64]); 4] = [
        ("online", 2, 0, &[1, 2]),
        ("online", 4, 2, &[3, 4]),
        ("pending", 5, 2, &[5]),
        ("online", 5, 5, &[]),
    ];

    let start = Utc::now();
    for (i, (label, tx_seq, rx_seq, new_seqs)) in cycles.into_iter().enumerate() {
        let at = start + Duration::seconds(30 * i as i64);
        let mut observed = ConnectionState::with_label(label);
        observed.tx_seq = Some(tx_seq);
        observed.rx_seq = Some(rx_seq);
        observed.tx_ts = Some(at);

        let recorded = db.record_observation(&src, &dst, &observed, new_seqs, at)?;
        println!(
            "cycle {}: {} added, {} settled",
            i,
            recorded.added.len(),
            recorded.settled.len()
        );
        if let Some(t) = recorded.transition {
            println!("   {} -> {}: {} => {}", t.src, t.dst, t.before.state, t.after.state);
        }
    }

    println!("\nEvent log:");
    for entry in db.store().query_logs(&LogKind::ALL)? {
        println!(
            "   #{} {} {:?} {}",
            entry.seq,
            entry.kind.as_str(),
            entry.payload,
            entry.ts.format("%H:%M:%S")
        );
    }

    println!("\n{:?}", db.store().stats()?);
    db.close()
}
