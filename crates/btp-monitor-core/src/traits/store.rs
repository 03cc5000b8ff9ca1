use crate::config::StoreConfig;
use crate::error::{MonitorError, Result};
use crate::network_id::NetworkId;
use crate::types::{
    ConnectionId, ConnectionState, LinkRecord, LogEntry, LogKind, LogPayload, LogQuery,
    StoreStats, TxRecord, TxSn,
};
use chrono::{DateTime, Utc};

/// Read operations shared by the store and by an open batch
///
/// Reads through a batch observe the batch's staged writes.
pub trait MonitorRead {
    /// Latest state of the `src -> dst` link, `None` if never written
    fn get_connection_state(
        &self,
        src: &NetworkId,
        dst: &NetworkId,
    ) -> Result<Option<ConnectionState>>;

    /// Every stored link, ordered by connection id
    fn list_connection_states(&self) -> Result<Vec<LinkRecord>>;

    /// Transaction records of a connection, oldest first
    fn get_tx_records(&self, connection_id: ConnectionId) -> Result<Vec<TxRecord>>;

    /// Number of transaction records held for a connection
    fn count_tx_records(&self, connection_id: ConnectionId) -> Result<usize>;

    /// Log entries whose kind is in `kinds`, in insertion order
    fn query_logs(&self, kinds: &[LogKind]) -> Result<Vec<LogEntry>> {
        self.query_logs_filtered(&LogQuery::kinds(kinds))
    }

    /// Log entries matching every populated field of `query`
    fn query_logs_filtered(&self, query: &LogQuery) -> Result<Vec<LogEntry>>;

    fn stats(&self) -> Result<StoreStats>;
}

/// Mutations staged inside one atomic batch
///
/// Nothing written here is visible outside the batch until it commits.
pub trait BatchTxn: MonitorRead {
    /// Upsert the state of `src -> dst`
    ///
    /// An existing row keeps its identity no matter what `state.id` holds.
    /// A new row gets a freshly allocated identity. Returns the stored copy.
    fn set_connection_state(
        &mut self,
        src: &NetworkId,
        dst: &NetworkId,
        state: &ConnectionState,
    ) -> Result<ConnectionState>;

    /// Append a transaction observation with a new ledger-wide `sn`
    fn add_tx_record(
        &mut self,
        connection_id: ConnectionId,
        seq: u64,
        ts: DateTime<Utc>,
    ) -> Result<TxRecord>;

    /// Remove the record with `sn`. Returns whether a row existed.
    fn delete_tx_record(&mut self, sn: TxSn) -> Result<bool>;

    /// Append an entry to the event log
    fn write_log(
        &mut self,
        ts: DateTime<Utc>,
        src: &str,
        dst: &str,
        kind: LogKind,
        payload: &LogPayload,
    ) -> Result<LogEntry>;
}

/// Transactional monitor state store
///
/// Reads may run in parallel. Writes and batches hold exclusive access for
/// their full duration.
pub trait MonitorStore: MonitorRead + Send + Sync {
    type Batch<'a>: BatchTxn
    where
        Self: 'a;

    /// Open a store
    fn open(cfg: StoreConfig) -> Result<Self>
    where
        Self: Sized;

    /// Close the store. Every later call fails with `InvalidState`.
    fn close(&self) -> Result<()>;

    /// Run `f` as one atomic unit of work
    ///
    /// On `Ok` every mutation made through the batch commits together. On
    /// `Err` they are all discarded and the error is returned as-is. Batches
    /// do not nest: calling back into the store from inside `f` fails with
    /// [`MonitorError::ReentrantAccess`].
    fn run_batch<'s, T, E, F>(&'s self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self::Batch<'s>) -> std::result::Result<T, E>,
        E: From<MonitorError>;

    fn set_connection_state(
        &self,
        src: &NetworkId,
        dst: &NetworkId,
        state: &ConnectionState,
    ) -> Result<ConnectionState> {
        self.run_batch(|b| b.set_connection_state(src, dst, state))
    }

    fn add_tx_record(
        &self,
        connection_id: ConnectionId,
        seq: u64,
        ts: DateTime<Utc>,
    ) -> Result<TxRecord> {
        self.run_batch(|b| b.add_tx_record(connection_id, seq, ts))
    }

    fn delete_tx_record(&self, sn: TxSn) -> Result<bool> {
        self.run_batch(|b| b.delete_tx_record(sn))
    }

    fn write_log(
        &self,
        ts: DateTime<Utc>,
        src: &str,
        dst: &str,
        kind: LogKind,
        payload: &LogPayload,
    ) -> Result<LogEntry> {
        self.run_batch(|b| b.write_log(ts, src, dst, kind, payload))
    }
}
