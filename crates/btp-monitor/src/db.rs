//! Unified monitor database interface
//!
//! Owns the store behind an `Arc` so pollers, the alerting side and query
//! handlers can share one instance. There is no process-wide store: every
//! collaborator receives the `MonitorDb` (or a clone of its store) explicitly.

use crate::recorder::{self, Recorded};
use crate::{
    ConnectionState, MonitorError, MonitorStore, NetworkId, Result, SqliteBatch,
    SqliteMonitorStore, StoreConfig,
};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Unified monitor database
pub struct MonitorDb {
    store: Arc<SqliteMonitorStore>,
}

impl MonitorDb {
    /// Open a file-backed database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(StoreConfig::new(path.as_ref()))
    }

    /// Open a database that lives only in memory
    pub fn open_in_memory() -> Result<Self> {
        Self::open_with_config(StoreConfig::in_memory())
    }

    /// Open with a custom configuration
    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        let store = Arc::new(SqliteMonitorStore::open(config)?);
        Ok(Self { store })
    }

    /// Get reference to the store
    pub fn store(&self) -> &Arc<SqliteMonitorStore> {
        &self.store
    }

    /// Record one polling observation of `src -> dst` in a single batch
    ///
    /// See [`recorder::record_observation`].
    pub fn record_observation(
        &self,
        src: &NetworkId,
        dst: &NetworkId,
        observed: &ConnectionState,
        new_tx_seqs: &[u64],
        at: DateTime<Utc>,
    ) -> Result<Recorded> {
        self.store.run_batch(|batch| {
            recorder::record_observation(batch, src, dst, observed, new_tx_seqs, at)
        })
    }

    /// Run a batch from async code
    ///
    /// Wraps [`MonitorStore::run_batch`] inside `spawn_blocking` so it is
    /// safe to call from an async poller without blocking the runtime.
    pub async fn run_batch_async<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut SqliteBatch<'_>) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<MonitorError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);

        tokio::task::spawn_blocking(move || store.run_batch(f))
            .await
            .map_err(|e| {
                E::from(MonitorError::Other(anyhow::anyhow!(
                    "Task join error: {}",
                    e
                )))
            })?
    }

    /// Flush and close the store
    ///
    /// Fails with `InvalidState` while another clone of the store `Arc` is
    /// still alive.
    pub fn close(self) -> Result<()> {
        let store = Arc::try_unwrap(self.store)
            .map_err(|_| MonitorError::InvalidState("Monitor store still in use".into()))?;
        store.close()
    }
}
