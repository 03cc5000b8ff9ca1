//! SQLite Read Connection Pool
//!
//! Provides a pool of read-only SQLite connections for concurrent reads.
//! A single SQLite connection cannot be shared between threads, so parallel
//! readers each need their own.

use btp_monitor_core::{
    error::{MonitorError, Result},
    observe, ReadPoolConfig,
};
use parking_lot::{Condvar, Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// A pooled read-only connection
///
/// The connection goes back to the pool when this guard is dropped.
pub struct PooledSqliteConnection<'a> {
    // Field order matters: the slot is unlocked before waiters are woken
    conn: MutexGuard<'a, Connection>,
    _release: ReleaseSignal<'a>,
}

/// Wakes one waiter in [`SqliteReadPool::acquire`] when dropped
struct ReleaseSignal<'a> {
    pool: &'a SqliteReadPool,
}

impl<'a> Drop for ReleaseSignal<'a> {
    fn drop(&mut self) {
        let _signal = self.pool.signal.lock();
        self.pool.released.notify_one();
    }
}

impl<'a> Deref for PooledSqliteConnection<'a> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

/// SQLite Read Connection Pool
///
/// Manages a fixed set of read-only SQLite connections. Each connection is
/// opened with the `SQLITE_OPEN_READ_ONLY` flag.
///
/// # Example
///
/// ```ignore
/// let pool = SqliteReadPool::new(&db_path, &ReadPoolConfig::enabled(4))?;
///
/// let conn = pool.acquire()?;
/// let count: i64 = conn.query_row("SELECT COUNT(*) FROM event_logs", [], |row| row.get(0))?;
/// // Connection is returned to pool when `conn` is dropped
/// ```
pub struct SqliteReadPool {
    connections: Vec<Mutex<Connection>>,
    // Held while scanning for a free slot so a release cannot be missed
    signal: Mutex<()>,
    released: Condvar,
    next: AtomicUsize,
    acquire_timeout: Duration,
    db_path: PathBuf,
}

impl SqliteReadPool {
    /// Create a new read pool with the given configuration
    ///
    /// Opens `pool_size` read-only connections to the database, which must
    /// already exist.
    pub fn new(db_path: &Path, config: &ReadPoolConfig) -> Result<Self> {
        let pool_size = config.pool_size.max(1);
        let mut connections = Vec::with_capacity(pool_size);

        for _ in 0..pool_size {
            let conn = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| MonitorError::Sqlite(e.to_string()))?;

            connections.push(Mutex::new(conn));
        }

        Ok(Self {
            connections,
            signal: Mutex::new(()),
            released: Condvar::new(),
            next: AtomicUsize::new(0),
            acquire_timeout: Duration::from_millis(config.acquire_timeout_ms),
            db_path: db_path.to_path_buf(),
        })
    }

    /// Acquire a pooled read-only connection
    ///
    /// Takes any idle connection if there is one, otherwise waits up to the
    /// configured timeout for any slot to free up.
    pub fn acquire(&self) -> Result<PooledSqliteConnection<'_>> {
        let deadline = Instant::now() + self.acquire_timeout;
        let mut signal = self.signal.lock();

        loop {
            let start = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
            if let Some(conn) = self.try_acquire_from(start) {
                return Ok(conn);
            }

            if self.released.wait_until(&mut signal, deadline).timed_out() {
                return self.try_acquire_from(0).ok_or_else(|| {
                    MonitorError::Timeout(format!(
                        "Read pool acquire timeout after {:?}",
                        self.acquire_timeout
                    ))
                });
            }
        }
    }

    /// Try to acquire a pooled read-only connection without waiting
    ///
    /// Returns `None` if no connection is immediately available.
    pub fn try_acquire(&self) -> Option<PooledSqliteConnection<'_>> {
        let start = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.try_acquire_from(start)
    }

    fn try_acquire_from(&self, start: usize) -> Option<PooledSqliteConnection<'_>> {
        let n = self.connections.len();
        for i in 0..n {
            if let Some(guard) = self.connections[(start + i) % n].try_lock() {
                observe::set_read_pool_available(self.available());
                return Some(PooledSqliteConnection {
                    conn: guard,
                    _release: ReleaseSignal { pool: self },
                });
            }
        }
        None
    }

    /// Number of idle connections
    pub fn available(&self) -> usize {
        self.connections.iter().filter(|c| !c.is_locked()).count()
    }

    /// Get the database path
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get the pool size
    pub fn pool_size(&self) -> usize {
        self.connections.len()
    }
}
