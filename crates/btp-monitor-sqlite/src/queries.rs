//! SQL shared by the store's read path and by open batches
//!
//! Every function takes a plain connection; the caller decides whether that
//! is a pooled read-only connection or the writer inside a transaction.

use btp_monitor_core::{
    error::{MonitorError, Result},
    ConnectionId, ConnectionState, LinkRecord, LogEntry, LogKind, LogPayload, LogQuery,
    NetworkId, Scalar, StoreStats, TxRecord, TxSn,
};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const STATE_COLUMNS: &str =
    "id, state, tx_state, tx_seq, tx_ts, tx_height, rx_state, rx_seq, rx_ts, rx_height";

fn sql_err(e: rusqlite::Error) -> MonitorError {
    MonitorError::Sqlite(e.to_string())
}

/// Timestamps are stored as nanoseconds since the Unix epoch
fn ts_to_sql(ts: &DateTime<Utc>) -> Result<i64> {
    ts.timestamp_nanos_opt()
        .ok_or_else(|| MonitorError::InvalidState(format!("timestamp out of range: {}", ts)))
}

fn opt_ts_to_sql(ts: &Option<DateTime<Utc>>) -> Result<Option<i64>> {
    ts.as_ref().map(ts_to_sql).transpose()
}

fn ts_from_sql(nanos: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos)
}

/// SQLite integers are signed; reject counters it cannot hold
fn check_counter(field: &str, value: Option<u64>) -> Result<()> {
    match value {
        Some(v) if v > i64::MAX as u64 => Err(MonitorError::InvalidState(format!(
            "{} out of range: {} exceeds {}",
            field,
            v,
            i64::MAX
        ))),
        _ => Ok(()),
    }
}

/// JSON has no NaN or infinity; serde_json would silently write `null`
fn check_payload(payload: &LogPayload) -> Result<()> {
    let finite = |v: &Scalar| !matches!(v, Scalar::Float(f) if !f.is_finite());
    let ok = match payload {
        LogPayload::Map(map) => map.values().all(finite),
        LogPayload::Value(v) => finite(v),
    };
    if ok {
        Ok(())
    } else {
        Err(MonitorError::Serialization(
            "log payload contains a non-finite float".into(),
        ))
    }
}

/// Map a row starting at column `at` laid out as [`STATE_COLUMNS`]
fn state_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<ConnectionState> {
    Ok(ConnectionState {
        id: Some(row.get(at)?),
        state: row.get(at + 1)?,
        tx_state: row.get(at + 2)?,
        tx_seq: row.get(at + 3)?,
        tx_ts: row.get::<_, Option<i64>>(at + 4)?.map(ts_from_sql),
        tx_height: row.get(at + 5)?,
        rx_state: row.get(at + 6)?,
        rx_seq: row.get(at + 7)?,
        rx_ts: row.get::<_, Option<i64>>(at + 8)?.map(ts_from_sql),
        rx_height: row.get(at + 9)?,
    })
}

fn tx_from_row(row: &Row<'_>) -> rusqlite::Result<TxRecord> {
    Ok(TxRecord {
        sn: row.get(0)?,
        connection_id: row.get(1)?,
        seq: row.get(2)?,
        ts: ts_from_sql(row.get(3)?),
    })
}

pub(crate) fn get_connection_state(
    conn: &Connection,
    src: &NetworkId,
    dst: &NetworkId,
) -> Result<Option<ConnectionState>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM connection_states WHERE src = ?1 AND dst = ?2",
            STATE_COLUMNS
        ),
        params![src.to_string(), dst.to_string()],
        |row| state_from_row(row, 0),
    )
    .optional()
    .map_err(sql_err)
}

pub(crate) fn set_connection_state(
    conn: &Connection,
    src: &NetworkId,
    dst: &NetworkId,
    state: &ConnectionState,
) -> Result<ConnectionState> {
    check_counter("tx_seq", state.tx_seq)?;
    check_counter("tx_height", state.tx_height)?;
    check_counter("rx_seq", state.rx_seq)?;
    check_counter("rx_height", state.rx_height)?;

    let src_key = src.to_string();
    let dst_key = dst.to_string();
    let tx_ts = opt_ts_to_sql(&state.tx_ts)?;
    let rx_ts = opt_ts_to_sql(&state.rx_ts)?;

    let existing: Option<ConnectionId> = conn
        .query_row(
            "SELECT id FROM connection_states WHERE src = ?1 AND dst = ?2",
            params![src_key, dst_key],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_err)?;

    let id = match existing {
        Some(id) => {
            conn.execute(
                "UPDATE connection_states SET
                    state = ?2, tx_state = ?3, tx_seq = ?4, tx_ts = ?5, tx_height = ?6,
                    rx_state = ?7, rx_seq = ?8, rx_ts = ?9, rx_height = ?10
                 WHERE id = ?1",
                params![
                    id,
                    state.state,
                    state.tx_state,
                    state.tx_seq,
                    tx_ts,
                    state.tx_height,
                    state.rx_state,
                    state.rx_seq,
                    rx_ts,
                    state.rx_height,
                ],
            )
            .map_err(sql_err)?;
            id
        }
        None => {
            conn.execute(
                "INSERT INTO connection_states
                    (src, dst, state, tx_state, tx_seq, tx_ts, tx_height,
                     rx_state, rx_seq, rx_ts, rx_height)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    src_key,
                    dst_key,
                    state.state,
                    state.tx_state,
                    state.tx_seq,
                    tx_ts,
                    state.tx_height,
                    state.rx_state,
                    state.rx_seq,
                    rx_ts,
                    state.rx_height,
                ],
            )
            .map_err(sql_err)?;
            conn.last_insert_rowid()
        }
    };

    Ok(state.clone().with_id(id))
}

pub(crate) fn list_connection_states(conn: &Connection) -> Result<Vec<LinkRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT src, dst, {} FROM connection_states ORDER BY id",
            STATE_COLUMNS
        ))
        .map_err(sql_err)?;

    let rows = stmt
        .query_map([], |row| {
            let src: String = row.get(0)?;
            let dst: String = row.get(1)?;
            Ok((src, dst, state_from_row(row, 2)?))
        })
        .map_err(sql_err)?;

    let mut links = Vec::new();
    for row in rows {
        let (src, dst, state) = row.map_err(sql_err)?;
        links.push(LinkRecord {
            src: NetworkId::parse(&src)?,
            dst: NetworkId::parse(&dst)?,
            state,
        });
    }
    Ok(links)
}

fn connection_exists(conn: &Connection, connection_id: ConnectionId) -> Result<bool> {
    conn.query_row(
        "SELECT 1 FROM connection_states WHERE id = ?1",
        [connection_id],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(sql_err)
}

pub(crate) fn add_tx_record(
    conn: &Connection,
    connection_id: ConnectionId,
    seq: u64,
    ts: DateTime<Utc>,
) -> Result<TxRecord> {
    check_counter("seq", Some(seq))?;
    if !connection_exists(conn, connection_id)? {
        return Err(MonitorError::UnknownConnection(connection_id));
    }

    conn.execute(
        "INSERT INTO tx_records (connection_id, seq, ts) VALUES (?1, ?2, ?3)",
        params![connection_id, seq, ts_to_sql(&ts)?],
    )
    .map_err(sql_err)?;

    Ok(TxRecord {
        sn: conn.last_insert_rowid(),
        connection_id,
        seq,
        ts,
    })
}

pub(crate) fn get_tx_records(
    conn: &Connection,
    connection_id: ConnectionId,
) -> Result<Vec<TxRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT sn, connection_id, seq, ts FROM tx_records
             WHERE connection_id = ?1 ORDER BY sn",
        )
        .map_err(sql_err)?;

    let records = stmt
        .query_map([connection_id], tx_from_row)
        .map_err(sql_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_err)?;
    Ok(records)
}

pub(crate) fn count_tx_records(conn: &Connection, connection_id: ConnectionId) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM tx_records WHERE connection_id = ?1",
            [connection_id],
            |row| row.get(0),
        )
        .map_err(sql_err)?;
    Ok(count as usize)
}

pub(crate) fn delete_tx_record(conn: &Connection, sn: TxSn) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM tx_records WHERE sn = ?1", [sn])
        .map_err(sql_err)?;
    Ok(removed > 0)
}

pub(crate) fn write_log(
    conn: &Connection,
    ts: DateTime<Utc>,
    src: &str,
    dst: &str,
    kind: LogKind,
    payload: &LogPayload,
) -> Result<LogEntry> {
    check_payload(payload)?;
    let encoded = serde_json::to_string(payload)?;

    conn.execute(
        "INSERT INTO event_logs (ts, src, dst, kind, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![ts_to_sql(&ts)?, src, dst, kind.as_str(), encoded],
    )
    .map_err(sql_err)?;

    Ok(LogEntry {
        seq: conn.last_insert_rowid(),
        ts,
        src: src.to_string(),
        dst: dst.to_string(),
        kind,
        payload: payload.clone(),
    })
}

pub(crate) fn query_logs(conn: &Connection, query: &LogQuery) -> Result<Vec<LogEntry>> {
    if query.kinds.is_empty() || query.limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut sql = String::from("SELECT seq, ts, src, dst, kind, payload FROM event_logs WHERE kind IN (");
    let mut values: Vec<Value> = Vec::new();
    for (i, kind) in query.kinds.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push('?');
        values.push(Value::Text(kind.as_str().to_string()));
    }
    sql.push(')');

    if let Some(src) = &query.src {
        sql.push_str(" AND src = ?");
        values.push(Value::Text(src.clone()));
    }
    if let Some(dst) = &query.dst {
        sql.push_str(" AND dst = ?");
        values.push(Value::Text(dst.clone()));
    }
    if let Some(since) = &query.since {
        sql.push_str(" AND ts >= ?");
        values.push(Value::Integer(ts_to_sql(since)?));
    }
    sql.push_str(" ORDER BY seq");
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(limit.min(i64::MAX as usize) as i64));
    }

    let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(sql_err)?;

    let mut entries = Vec::new();
    for row in rows {
        let (seq, ts, src, dst, kind, payload) = row.map_err(sql_err)?;
        entries.push(LogEntry {
            seq,
            ts: ts_from_sql(ts),
            src,
            dst,
            kind: kind.parse()?,
            payload: serde_json::from_str(&payload)?,
        });
    }
    Ok(entries)
}

pub(crate) fn stats(conn: &Connection) -> Result<StoreStats> {
    let count = |table: &str| -> Result<u64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as u64)
        .map_err(sql_err)
    };

    Ok(StoreStats {
        connections: count("connection_states")?,
        tx_records: count("tx_records")?,
        log_entries: count("event_logs")?,
    })
}
