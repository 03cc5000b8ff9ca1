use btp_monitor_core::error::{MonitorError, Result};
use rusqlite::{Connection, OptionalExtension};

/// Schema version written by this crate
pub const SCHEMA_VERSION: u32 = 1;

const TABLES: &str = "
CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 0),
    schema_version INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS connection_states (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    src TEXT NOT NULL,
    dst TEXT NOT NULL,
    state TEXT NOT NULL,
    tx_state TEXT NOT NULL,
    tx_seq INTEGER,
    tx_ts INTEGER,
    tx_height INTEGER,
    rx_state TEXT NOT NULL,
    rx_seq INTEGER,
    rx_ts INTEGER,
    rx_height INTEGER,
    UNIQUE (src, dst)
);

CREATE TABLE IF NOT EXISTS tx_records (
    sn INTEGER PRIMARY KEY AUTOINCREMENT,
    connection_id INTEGER NOT NULL REFERENCES connection_states(id),
    seq INTEGER NOT NULL,
    ts INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tx_records_connection
    ON tx_records (connection_id, sn);

CREATE TABLE IF NOT EXISTS event_logs (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    ts INTEGER NOT NULL,
    src TEXT NOT NULL,
    dst TEXT NOT NULL,
    kind TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_event_logs_kind
    ON event_logs (kind, seq);
";

/// Create the tables if needed and check the stored schema version
///
/// There is no migration path: a database written with a different schema
/// version is refused.
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(TABLES)
        .map_err(|e| MonitorError::Sqlite(e.to_string()))?;

    conn.execute(
        "INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (0, ?1)",
        [SCHEMA_VERSION as i64],
    )
    .map_err(|e| MonitorError::Sqlite(e.to_string()))?;

    let found = schema_version(conn)?;
    if found != SCHEMA_VERSION {
        return Err(MonitorError::Config(format!(
            "Unsupported schema version {} (expected {})",
            found, SCHEMA_VERSION
        )));
    }
    Ok(())
}

/// Read the schema version recorded in `store_meta`
pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version: Option<i64> = conn
        .query_row(
            "SELECT schema_version FROM store_meta WHERE id = 0",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| MonitorError::Sqlite(e.to_string()))?;

    version
        .map(|v| v as u32)
        .ok_or_else(|| MonitorError::InvalidState("store_meta row missing".into()))
}
