use crate::queries;
use btp_monitor_core::{
    error::{MonitorError, Result},
    BatchTxn, ConnectionId, ConnectionState, LinkRecord, LogEntry, LogKind, LogPayload,
    LogQuery, MonitorRead, NetworkId, StoreStats, TxRecord, TxSn,
};
use chrono::{DateTime, Utc};
use parking_lot::MutexGuard;
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};

/// One atomic unit of work on the writer connection
///
/// Wraps a `BEGIN IMMEDIATE` transaction. Dropping a batch that was neither
/// committed nor rolled back rolls it back, which covers a panicking unit of
/// work.
pub struct SqliteBatch<'a> {
    conn: MutexGuard<'a, Connection>,
    poisoned: &'a AtomicBool,
    in_txn: bool,
    writes: usize,
}

impl<'a> SqliteBatch<'a> {
    pub(crate) fn begin(conn: MutexGuard<'a, Connection>, poisoned: &'a AtomicBool) -> Result<Self> {
        conn.execute_batch("BEGIN IMMEDIATE TRANSACTION")
            .map_err(|e| MonitorError::Sqlite(e.to_string()))?;

        Ok(Self {
            conn,
            poisoned,
            in_txn: true,
            writes: 0,
        })
    }

    /// Number of mutations staged so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Make every staged mutation visible
    ///
    /// A failed COMMIT is rolled back before the error is returned.
    pub(crate) fn commit(mut self) -> Result<()> {
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            let err = MonitorError::Sqlite(e.to_string());
            self.rollback_inner()?;
            return Err(err);
        }
        self.in_txn = false;
        Ok(())
    }

    /// Discard every staged mutation
    ///
    /// Fails only with [`MonitorError::RollbackFailed`].
    pub(crate) fn rollback(mut self) -> Result<()> {
        self.rollback_inner()
    }

    fn rollback_inner(&mut self) -> Result<()> {
        if !self.in_txn {
            return Ok(());
        }
        self.in_txn = false;

        // Some failures make SQLite abort the transaction on its own
        if self.conn.is_autocommit() {
            return Ok(());
        }

        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| MonitorError::RollbackFailed(e.to_string()))
    }
}

impl<'a> Drop for SqliteBatch<'a> {
    fn drop(&mut self) {
        if self.in_txn {
            if let Err(e) = self.rollback_inner() {
                tracing::error!("Rollback of abandoned batch failed, store poisoned: {}", e);
                self.poisoned.store(true, Ordering::SeqCst);
            }
        }
    }
}

impl<'a> MonitorRead for SqliteBatch<'a> {
    fn get_connection_state(
        &self,
        src: &NetworkId,
        dst: &NetworkId,
    ) -> Result<Option<ConnectionState>> {
        queries::get_connection_state(&self.conn, src, dst)
    }

    fn list_connection_states(&self) -> Result<Vec<LinkRecord>> {
        queries::list_connection_states(&self.conn)
    }

    fn get_tx_records(&self, connection_id: ConnectionId) -> Result<Vec<TxRecord>> {
        queries::get_tx_records(&self.conn, connection_id)
    }

    fn count_tx_records(&self, connection_id: ConnectionId) -> Result<usize> {
        queries::count_tx_records(&self.conn, connection_id)
    }

    fn query_logs_filtered(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        queries::query_logs(&self.conn, query)
    }

    fn stats(&self) -> Result<StoreStats> {
        queries::stats(&self.conn)
    }
}

impl<'a> BatchTxn for SqliteBatch<'a> {
    fn set_connection_state(
        &mut self,
        src: &NetworkId,
        dst: &NetworkId,
        state: &ConnectionState,
    ) -> Result<ConnectionState> {
        let stored = queries::set_connection_state(&self.conn, src, dst, state)?;
        self.writes += 1;
        Ok(stored)
    }

    fn add_tx_record(
        &mut self,
        connection_id: ConnectionId,
        seq: u64,
        ts: DateTime<Utc>,
    ) -> Result<TxRecord> {
        let record = queries::add_tx_record(&self.conn, connection_id, seq, ts)?;
        self.writes += 1;
        Ok(record)
    }

    fn delete_tx_record(&mut self, sn: TxSn) -> Result<bool> {
        let removed = queries::delete_tx_record(&self.conn, sn)?;
        if removed {
            self.writes += 1;
        }
        Ok(removed)
    }

    fn write_log(
        &mut self,
        ts: DateTime<Utc>,
        src: &str,
        dst: &str,
        kind: LogKind,
        payload: &LogPayload,
    ) -> Result<LogEntry> {
        let entry = queries::write_log(&self.conn, ts, src, dst, kind, payload)?;
        self.writes += 1;
        Ok(entry)
    }
}
