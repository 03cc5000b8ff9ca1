//! Endpoint identifiers for BTP networks
//!
//! A BTP address looks like `btp://0x7.icon/cx0000...`. The canonical
//! identifier joins its authority and path with a single `-`, which makes it
//! usable as a comparable storage key.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '-';
const SCHEME: &str = "btp://";

/// Canonical identifier of one side of a link
///
/// Holds the validated `(authority, path)` pair. Equality, ordering and
/// hashing are defined on the pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetworkId {
    authority: String,
    path: String,
}

impl NetworkId {
    /// Build an identifier from its parts
    pub fn new(authority: impl Into<String>, path: impl Into<String>) -> Result<Self> {
        let authority = authority.into();
        let path = path.into();
        let shown = format!("{}{}{}", authority, SEPARATOR, path);
        validate_part(&shown, &authority, "authority")?;
        validate_part(&shown, &path, "path")?;
        Ok(Self { authority, path })
    }

    /// Parse the canonical `authority-path` form
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(authority), Some(path), None) => Self::new(authority, path),
            _ => Err(MonitorError::decode(
                s,
                format!("expected exactly one '{}' separator", SEPARATOR),
            )),
        }
    }

    /// Convert a `btp://authority/path` address into an identifier
    pub fn from_address(addr: &str) -> Result<Self> {
        let rest = addr
            .strip_prefix(SCHEME)
            .ok_or_else(|| MonitorError::decode(addr, "missing btp:// scheme"))?;
        let (authority, path) = rest
            .split_once('/')
            .ok_or_else(|| MonitorError::decode(addr, "missing path"))?;
        Self::new(authority, path).map_err(|_| {
            MonitorError::decode(addr, "authority and path must be non-empty and contain no '-'")
        })
    }

    /// The `btp://authority/path` address form
    pub fn address(&self) -> String {
        format!("{}{}/{}", SCHEME, self.authority, self.path)
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn validate_part(shown: &str, part: &str, what: &str) -> Result<()> {
    if part.is_empty() {
        return Err(MonitorError::decode(shown, format!("empty {}", what)));
    }
    if part.contains(SEPARATOR) {
        return Err(MonitorError::decode(
            shown,
            format!("expected exactly one '{}' separator", SEPARATOR),
        ));
    }
    if part.contains('/') && what == "authority" {
        return Err(MonitorError::decode(shown, "authority contains '/'"));
    }
    Ok(())
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.authority, SEPARATOR, self.path)
    }
}

impl FromStr for NetworkId {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for NetworkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NetworkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let id = NetworkId::parse("0x7.icon-cx1234").unwrap();
        assert_eq!(id.authority(), "0x7.icon");
        assert_eq!(id.path(), "cx1234");
        assert_eq!(id.to_string(), "0x7.icon-cx1234");
        assert_eq!(id.address(), "btp://0x7.icon/cx1234");
    }

    #[test]
    fn test_from_address_roundtrips_through_address() {
        let addr = "btp://0xaa36a7.eth2/0xabcdef";
        let id = NetworkId::from_address(addr).unwrap();
        assert_eq!(id.to_string(), "0xaa36a7.eth2-0xabcdef");
        assert_eq!(id.address(), addr);
    }

    #[test]
    fn test_rejects_missing_separator() {
        let err = NetworkId::parse("0x7.icon").unwrap_err();
        match err {
            MonitorError::Decode { value, .. } => assert_eq!(value, "0x7.icon"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_extra_separators() {
        assert!(matches!(
            NetworkId::parse("a-b-c"),
            Err(MonitorError::Decode { .. })
        ));
        assert!(matches!(
            NetworkId::parse("-b"),
            Err(MonitorError::Decode { .. })
        ));
        assert!(matches!(
            NetworkId::parse(""),
            Err(MonitorError::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_addresses() {
        assert!(NetworkId::from_address("http://0x7.icon/cx1").is_err());
        assert!(NetworkId::from_address("btp://0x7.icon").is_err());
        assert!(NetworkId::from_address("btp://0x7-icon/cx1").is_err());
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = NetworkId::parse("0x1.icon-cx01").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0x1.icon-cx01\"");
        let back: NetworkId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<NetworkId>("\"nope\"").is_err());
    }
}
