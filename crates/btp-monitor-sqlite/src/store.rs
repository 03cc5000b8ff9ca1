use btp_monitor_core::{
    error::{MonitorError, Result},
    observe, ConnectionId, ConnectionState, LinkRecord, LogEntry, LogQuery, MonitorRead,
    MonitorStore, NetworkId, StoreConfig, StoreStats, TxRecord,
};
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rusqlite::{Connection, OpenFlags};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crate::queries;
use crate::read_pool::SqliteReadPool;
use crate::schema;
use crate::txn::SqliteBatch;

/// SQLite-backed monitor state store
///
/// All access goes through `gate`, a task-fair reader/writer lock: once a
/// writer is queued, later readers wait behind it, so a steady stream of
/// reads cannot starve the pollers.
pub struct SqliteMonitorStore {
    gate: RwLock<()>,
    // Thread currently holding the gate exclusively
    holder: Mutex<Option<ThreadId>>,
    writer: Mutex<Connection>,
    readers: Option<SqliteReadPool>,
    poisoned: AtomicBool,
    closed: AtomicBool,
    config: StoreConfig,
}

/// Exclusive hold on the gate. Clears `holder` before the gate is released.
struct ExclusiveAccess<'a> {
    holder: &'a Mutex<Option<ThreadId>>,
    _gate: RwLockWriteGuard<'a, ()>,
}

impl<'a> Drop for ExclusiveAccess<'a> {
    fn drop(&mut self) {
        *self.holder.lock() = None;
    }
}

impl SqliteMonitorStore {
    /// Get the configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether a failed rollback has left the store unusable
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }

    /// Schema version recorded in the database
    pub fn schema_version(&self) -> Result<u32> {
        self.with_reader(schema::schema_version)
    }

    /// Configure SQLite connection
    fn configure_connection(conn: &Connection, cfg: &StoreConfig) -> Result<()> {
        // WAL lets the read pool see committed data while the writer is idle
        if cfg.wal_mode && !cfg.is_in_memory() {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(|e| MonitorError::Config(e.to_string()))?;
            tracing::debug!("journal_mode = {}", mode);
        }

        conn.pragma_update(None, "synchronous", cfg.synchronous.as_pragma())
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        conn.pragma_update(None, "cache_size", cfg.cache_size)
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        conn.busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        Ok(())
    }

    fn open_writer(cfg: &StoreConfig) -> Result<Connection> {
        match &cfg.path {
            Some(path) => {
                // Create parent directory if needed
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
                )
                .map_err(|e| MonitorError::Sqlite(e.to_string()))
            }
            None => Connection::open_in_memory().map_err(|e| MonitorError::Sqlite(e.to_string())),
        }
    }

    /// Whether [`MonitorStore::close`] has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> Result<()> {
        if self.is_poisoned() {
            return Err(MonitorError::Poisoned);
        }
        if self.is_closed() {
            return Err(MonitorError::InvalidState("store closed".into()));
        }
        Ok(())
    }

    fn check_usable(&self) -> Result<()> {
        self.check_open()?;
        if *self.holder.lock() == Some(thread::current().id()) {
            return Err(MonitorError::ReentrantAccess);
        }
        Ok(())
    }

    fn enter_shared(&self) -> Result<RwLockReadGuard<'_, ()>> {
        self.check_usable()?;
        let started = Instant::now();
        let guard = self.gate.read();
        observe::record_lock_wait(started.elapsed(), false);
        self.check_open()?;
        Ok(guard)
    }

    fn enter_exclusive(&self) -> Result<ExclusiveAccess<'_>> {
        self.check_usable()?;
        let started = Instant::now();
        let gate = self.gate.write();
        observe::record_lock_wait(started.elapsed(), true);
        *self.holder.lock() = Some(thread::current().id());

        let access = ExclusiveAccess {
            holder: &self.holder,
            _gate: gate,
        };

        // The store may have been poisoned or closed while this thread was
        // queued
        self.check_open()?;
        Ok(access)
    }

    /// Run a read against a pooled connection, or the writer when there is
    /// no pool
    fn with_reader<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let _shared = self.enter_shared()?;
        match &self.readers {
            Some(pool) => {
                let conn = pool.acquire()?;
                f(&conn)
            }
            None => {
                let conn = self.writer.lock();
                f(&conn)
            }
        }
    }

    fn poison(&self, err: &MonitorError) {
        tracing::error!("Store poisoned: {}", err);
        self.poisoned.store(true, Ordering::SeqCst);
    }
}

impl MonitorRead for SqliteMonitorStore {
    fn get_connection_state(
        &self,
        src: &NetworkId,
        dst: &NetworkId,
    ) -> Result<Option<ConnectionState>> {
        self.with_reader(|conn| queries::get_connection_state(conn, src, dst))
    }

    fn list_connection_states(&self) -> Result<Vec<LinkRecord>> {
        self.with_reader(queries::list_connection_states)
    }

    fn get_tx_records(&self, connection_id: ConnectionId) -> Result<Vec<TxRecord>> {
        self.with_reader(|conn| queries::get_tx_records(conn, connection_id))
    }

    fn count_tx_records(&self, connection_id: ConnectionId) -> Result<usize> {
        self.with_reader(|conn| queries::count_tx_records(conn, connection_id))
    }

    fn query_logs_filtered(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        self.with_reader(|conn| queries::query_logs(conn, query))
    }

    fn stats(&self) -> Result<StoreStats> {
        self.with_reader(queries::stats)
    }
}

impl MonitorStore for SqliteMonitorStore {
    type Batch<'a> = SqliteBatch<'a>;

    fn open(cfg: StoreConfig) -> Result<Self> {
        cfg.validate()?;

        let conn = Self::open_writer(&cfg)?;
        Self::configure_connection(&conn, &cfg)?;
        schema::init(&conn)?;

        let readers = match (&cfg.path, cfg.read_pool.enabled) {
            (Some(path), true) => Some(SqliteReadPool::new(path, &cfg.read_pool)?),
            _ => None,
        };

        tracing::info!(
            "Opened monitor store at {} (read pool: {})",
            cfg.path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string()),
            readers.as_ref().map(|p| p.pool_size()).unwrap_or(0)
        );

        Ok(Self {
            gate: RwLock::new(()),
            holder: Mutex::new(None),
            writer: Mutex::new(conn),
            readers,
            poisoned: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            config: cfg,
        })
    }

    fn close(&self) -> Result<()> {
        // Wait for in-flight work, then flush the WAL into the main file
        let _exclusive = self.enter_exclusive()?;
        self.closed.store(true, Ordering::SeqCst);
        if self.config.wal_mode && !self.config.is_in_memory() {
            let conn = self.writer.lock();
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
                .map_err(|e| MonitorError::Sqlite(e.to_string()))?;
        }
        tracing::debug!("Monitor store closed");
        Ok(())
    }

    fn run_batch<'s, T, E, F>(&'s self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self::Batch<'s>) -> std::result::Result<T, E>,
        E: From<MonitorError>,
    {
        let _exclusive = self.enter_exclusive()?;
        let started = Instant::now();
        let mut batch = SqliteBatch::begin(self.writer.lock(), &self.poisoned)?;

        match f(&mut batch) {
            Ok(value) => {
                let writes = batch.writes();
                match batch.commit() {
                    Ok(()) => {
                        observe::record_commit(started.elapsed());
                        tracing::trace!("Batch committed ({} writes)", writes);
                        Ok(value)
                    }
                    Err(e) => {
                        if e.is_fatal() {
                            observe::record_rollback(false);
                            self.poison(&e);
                        } else {
                            observe::record_rollback(true);
                            tracing::warn!("Batch commit failed, rolled back: {}", e);
                        }
                        Err(e.into())
                    }
                }
            }
            Err(err) => match batch.rollback() {
                Ok(()) => {
                    observe::record_rollback(true);
                    tracing::debug!("Batch failed, rolled back");
                    Err(err)
                }
                Err(rollback_err) => {
                    observe::record_rollback(false);
                    self.poison(&rollback_err);
                    Err(rollback_err.into())
                }
            },
        }
    }
}
