//! Optional metrics instrumentation.
//!
//! When the `observe` feature is enabled, store operations emit counters,
//! histograms, and gauges via the [`metrics`] crate. A downstream
//! application must install a metrics recorder to collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record a committed batch.
///
/// - `btp_monitor.batch.commits_total` – counter
/// - `btp_monitor.batch.commit_duration_seconds` – histogram of batch latency
#[inline]
pub fn record_commit(duration: std::time::Duration) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("btp_monitor.batch.commits_total").increment(1);
        metrics::histogram!("btp_monitor.batch.commit_duration_seconds")
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = duration;
    }
}

/// Record a rolled back batch.
///
/// - `btp_monitor.batch.rollbacks_total` – counter with `outcome` label
///   (`ok` / `fail`)
#[inline]
pub fn record_rollback(success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("btp_monitor.batch.rollbacks_total", "outcome" => outcome)
            .increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = success;
    }
}

/// Record how long a caller waited for the store gate.
///
/// - `btp_monitor.lock.wait_duration_seconds` – histogram with `mode` label
///   (`read` / `write`)
#[inline]
pub fn record_lock_wait(duration: std::time::Duration, exclusive: bool) {
    #[cfg(feature = "observe")]
    {
        let mode = if exclusive { "write" } else { "read" };
        metrics::histogram!("btp_monitor.lock.wait_duration_seconds", "mode" => mode)
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, exclusive);
    }
}

/// Set the number of idle connections in the read pool.
///
/// - `btp_monitor.read_pool.available` – gauge
#[inline]
pub fn set_read_pool_available(available: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::gauge!("btp_monitor.read_pool.available").set(available as f64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = available;
    }
}
