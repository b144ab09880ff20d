//! Stable identities for contacts and addresses
//!
//! ID Format:
//! - Contact IDs: `c-{12-char-hash}` (e.g., `c-7f2b4c19ae03`)
//! - Address IDs: `d-{12-char-hash}` (e.g., `d-9d3e5f21b774`)
//!
//! The hash is derived from a seed string plus creation timestamp, so the
//! same name registered at different times produces different identities.
//! IDs are opaque and never change for the lifetime of a record. The
//! reserved all-zero value is the sentinel returned when an add was a
//! no-op (duplicate identity).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const HASH_LEN: usize = 12;
const SENTINEL_HASH: &str = "000000000000";

#[derive(Debug, Error, PartialEq)]
pub enum PidError {
    #[error("Invalid pid format: expected 'c-{{12-char-hash}}' or 'd-{{12-char-hash}}', got '{0}'")]
    InvalidFormat(String),
}

/// Which table an identity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PidKind {
    Contact,
    Address,
}

impl PidKind {
    fn prefix(self) -> char {
        match self {
            PidKind::Contact => 'c',
            PidKind::Address => 'd',
        }
    }
}

/// Generates a 12-character hash from a seed string and timestamp
fn generate_hash(seed: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", seed, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..HASH_LEN].to_string()
}

/// An opaque, stable unique identity for one contact or address
///
/// Equality on `Pid` is identity equality: two records with the same pid
/// are the same record regardless of field values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pid {
    hash: String,
    kind: PidKind,
}

impl Pid {
    /// Creates a new contact identity from a seed and timestamp
    pub fn contact(seed: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(seed, timestamp),
            kind: PidKind::Contact,
        }
    }

    /// Creates a new address identity from a seed and timestamp
    pub fn address(seed: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(seed, timestamp),
            kind: PidKind::Address,
        }
    }

    /// The reserved identity meaning "no new record was created"
    pub fn sentinel() -> Self {
        Self {
            hash: SENTINEL_HASH.to_string(),
            kind: PidKind::Contact,
        }
    }

    /// Returns true for the reserved no-op identity
    pub fn is_sentinel(&self) -> bool {
        self.hash == SENTINEL_HASH
    }

    /// Returns the hash portion of the ID
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Returns which table this identity belongs to
    pub fn kind(&self) -> PidKind {
        self.kind
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.hash)
    }
}

impl FromStr for Pid {
    type Err = PidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (kind, hash) = if let Some(rest) = s.strip_prefix("c-") {
            (PidKind::Contact, rest)
        } else if let Some(rest) = s.strip_prefix("d-") {
            (PidKind::Address, rest)
        } else {
            return Err(PidError::InvalidFormat(s.to_string()));
        };

        if hash.len() != HASH_LEN || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PidError::InvalidFormat(s.to_string()));
        }

        Ok(Self {
            hash: hash.to_string(),
            kind,
        })
    }
}

impl TryFrom<String> for Pid {
    type Error = PidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pid> for String {
    fn from(id: Pid) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_pid_unique_for_different_timestamps() {
        let seed = "John Smith";
        let ts1 = Utc::now();
        let ts2 = ts1 + chrono::Duration::nanoseconds(1);

        assert_ne!(Pid::contact(seed, ts1), Pid::contact(seed, ts2));
    }

    #[test]
    fn contact_pid_format() {
        let id = Pid::contact("John", Utc::now());
        let s = id.to_string();

        assert!(s.starts_with("c-"));
        assert_eq!(s.len(), 14); // "c-" + 12 chars
    }

    #[test]
    fn address_pid_format() {
        let id = Pid::address("Main Street 123", Utc::now());
        assert!(id.to_string().starts_with("d-"));
        assert_eq!(id.kind(), PidKind::Address);
    }

    #[test]
    fn pid_parses_correctly() {
        let original = Pid::contact("John", Utc::now());
        let parsed: Pid = original.to_string().parse().unwrap();

        assert_eq!(original, parsed);
    }

    #[test]
    fn pid_rejects_invalid_format() {
        assert!("invalid".parse::<Pid>().is_err());
        assert!("c-short".parse::<Pid>().is_err());
        assert!("c-toolonghash1234".parse::<Pid>().is_err());
        assert!("c-gggggggggggg".parse::<Pid>().is_err()); // 'g' is not hex
        assert!("x-7f2b4c19ae03".parse::<Pid>().is_err()); // unknown prefix
    }

    #[test]
    fn sentinel_is_recognized() {
        let sentinel = Pid::sentinel();
        assert!(sentinel.is_sentinel());
        assert_eq!(sentinel.to_string(), "c-000000000000");

        let real = Pid::contact("John", Utc::now());
        assert!(!real.is_sentinel());
    }

    #[test]
    fn serde_roundtrip() {
        let original = Pid::address("Elm Street", Utc::now());
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Pid = serde_json::from_str(&json).unwrap();

        assert_eq!(original, parsed);
    }
}
