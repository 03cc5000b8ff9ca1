use crate::error::MonitorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind tag of an event log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Transmit-side activity observed
    Tx,
    /// Receive-side activity observed
    Rx,
    /// Link state transition
    State,
    /// Freeform message
    Log,
}

impl LogKind {
    pub const ALL: [LogKind; 4] = [LogKind::Tx, LogKind::Rx, LogKind::State, LogKind::Log];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Tx => "tx",
            LogKind::Rx => "rx",
            LogKind::State => "state",
            LogKind::Log => "log",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogKind {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tx" => Ok(LogKind::Tx),
            "rx" => Ok(LogKind::Rx),
            "state" => Ok(LogKind::State),
            "log" => Ok(LogKind::Log),
            other => Err(MonitorError::InvalidState(format!(
                "unknown log kind: {}",
                other
            ))),
        }
    }
}

/// Primitive value inside a log payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Scalar::Int(v),
            Err(_) => Scalar::Text(v.to_string()),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

/// Opaque payload of a log entry
///
/// Either an ordered key-value mapping of primitives or a single value.
/// The store persists it as JSON and never looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogPayload {
    Map(BTreeMap<String, Scalar>),
    Value(Scalar),
}

impl LogPayload {
    /// Build a mapping payload from key-value pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Scalar>,
        I: IntoIterator<Item = (K, V)>,
    {
        LogPayload::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        match self {
            LogPayload::Map(m) => m.get(key),
            LogPayload::Value(_) => None,
        }
    }
}

impl From<Scalar> for LogPayload {
    fn from(v: Scalar) -> Self {
        LogPayload::Value(v)
    }
}

impl From<&str> for LogPayload {
    fn from(v: &str) -> Self {
        LogPayload::Value(v.into())
    }
}

impl From<String> for LogPayload {
    fn from(v: String) -> Self {
        LogPayload::Value(v.into())
    }
}

/// One diagnostic record in the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Store-assigned position in the log
    pub seq: i64,

    pub ts: DateTime<Utc>,

    /// Source endpoint id, or empty for store-wide entries
    pub src: String,

    /// Destination endpoint id, or empty for store-wide entries
    pub dst: String,

    pub kind: LogKind,

    pub payload: LogPayload,
}

/// Filter for [`query_logs_filtered`](crate::traits::MonitorRead::query_logs_filtered)
///
/// An empty `kinds` set matches nothing. The optional fields narrow the
/// result further.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub kinds: Vec<LogKind>,
    pub src: Option<String>,
    pub dst: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl LogQuery {
    pub fn kinds(kinds: &[LogKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            ..Default::default()
        }
    }

    pub fn with_link(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self.dst = Some(dst.into());
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_json_shapes() {
        let map = LogPayload::map([("count", Scalar::Int(3)), ("delta", Scalar::Float(30.3))]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"count":3,"delta":30.3}"#);
        assert_eq!(serde_json::from_str::<LogPayload>(&json).unwrap(), map);

        let text = LogPayload::from("yahoo");
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, r#""yahoo""#);
        assert_eq!(serde_json::from_str::<LogPayload>(&json).unwrap(), text);
    }

    #[test]
    fn test_scalar_null_and_bool() {
        let p = LogPayload::map([("ok", Scalar::Bool(true)), ("reason", Scalar::Null)]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(serde_json::from_str::<LogPayload>(&json).unwrap(), p);
        assert_eq!(p.get("ok"), Some(&Scalar::Bool(true)));
    }

    #[test]
    fn test_kind_parse() {
        for kind in LogKind::ALL {
            assert_eq!(kind.as_str().parse::<LogKind>().unwrap(), kind);
        }
        assert!("fee".parse::<LogKind>().is_err());
    }
}
