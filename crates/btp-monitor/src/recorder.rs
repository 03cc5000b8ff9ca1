//! Recording polling observations
//!
//! A poller compares live bridge status against the stored state. This
//! module turns one observation into the writes that belong together: the
//! new connection state, the transactions seen since the last poll, the
//! transactions the destination has now received, and the matching log
//! entries. Run it inside a batch so they commit or roll back as one.

use crate::{
    BatchTxn, ConnectionState, LogKind, LogPayload, NetworkId, Result, Scalar, TxRecord,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A change of the overall link state, for the alerting side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub src: NetworkId,
    pub dst: NetworkId,
    pub before: ConnectionState,
    pub after: ConnectionState,
}

/// Everything written for one observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// Stored state, identity included
    pub state: ConnectionState,

    /// Ledger entries added for newly sent transactions
    pub added: Vec<TxRecord>,

    /// Ledger entries removed because the destination received them
    pub settled: Vec<TxRecord>,

    /// Set when the overall state label changed. The first observation of a
    /// link is not a transition.
    pub transition: Option<Transition>,
}

/// Apply one observation of `src -> dst` through `batch`
///
/// 1. Stores `observed` as the link's state.
/// 2. Adds a ledger entry for each of `new_tx_seqs`, stamped with `at`.
/// 3. Removes ledger entries whose sequence is covered by `observed.rx_seq`.
/// 4. Writes `tx`, `rx` and `state` log entries for whatever happened.
pub fn record_observation<B: BatchTxn>(
    batch: &mut B,
    src: &NetworkId,
    dst: &NetworkId,
    observed: &ConnectionState,
    new_tx_seqs: &[u64],
    at: DateTime<Utc>,
) -> Result<Recorded> {
    let before = batch.get_connection_state(src, dst)?;
    let state = batch.set_connection_state(src, dst, observed)?;
    let Some(connection_id) = state.id else {
        return Err(crate::MonitorError::InvalidState(
            "stored connection state has no identity".into(),
        ));
    };

    let (src_key, dst_key) = (src.to_string(), dst.to_string());

    let mut added = Vec::with_capacity(new_tx_seqs.len());
    for &seq in new_tx_seqs {
        added.push(batch.add_tx_record(connection_id, seq, at)?);
    }
    if !added.is_empty() {
        batch.write_log(
            at,
            &src_key,
            &dst_key,
            LogKind::Tx,
            &LogPayload::map([("count", Scalar::from(added.len() as u64))]),
        )?;
    }

    let mut settled = Vec::new();
    if let Some(rx_seq) = state.rx_seq {
        for record in batch.get_tx_records(connection_id)? {
            if record.seq <= rx_seq && batch.delete_tx_record(record.sn)? {
                settled.push(record);
            }
        }
    }
    if !settled.is_empty() {
        // Longest time a settled transaction waited for delivery
        let delta = settled
            .iter()
            .map(|r| (at - r.ts).num_milliseconds() as f64 / 1000.0)
            .fold(0.0_f64, f64::max);
        batch.write_log(
            at,
            &src_key,
            &dst_key,
            LogKind::Rx,
            &LogPayload::map([
                ("count", Scalar::from(settled.len() as u64)),
                ("delta", Scalar::Float(delta)),
            ]),
        )?;
    }

    let transition = match before {
        Some(before) if before.state != state.state => {
            batch.write_log(
                at,
                &src_key,
                &dst_key,
                LogKind::State,
                &LogPayload::map([
                    ("before", before.state.as_str()),
                    ("after", state.state.as_str()),
                ]),
            )?;
            tracing::info!(
                "Link {} -> {} changed state: {} => {}",
                src,
                dst,
                before.state,
                state.state
            );
            Some(Transition {
                src: src.clone(),
                dst: dst.clone(),
                before,
                after: state.clone(),
            })
        }
        _ => None,
    };

    Ok(Recorded {
        state,
        added,
        settled,
        transition,
    })
}
