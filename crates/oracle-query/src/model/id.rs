//! Query identifiers.
//!
//! A query id is 32 bytes. For most queries it is the Keccak-256 hash of the
//! query data. Legacy requests instead use their small integer id, encoded
//! as a 32-byte big-endian number.

use std::fmt;
use std::str::FromStr;

use sha3::{Digest, Keccak256};

use crate::error::QueryError;
use crate::limits::QUERY_ID_LEN;

/// A 32-byte query identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub [u8; QUERY_ID_LEN]);

impl QueryId {
    /// Derives the id of non-legacy query data.
    ///
    /// ```text
    /// query_id = keccak256(query_data)
    /// ```
    pub fn from_query_data(query_data: &[u8]) -> QueryId {
        QueryId(keccak256(query_data))
    }

    /// Builds the id of a legacy request: the id as a 32-byte big-endian integer.
    pub fn from_legacy(legacy_id: u64) -> QueryId {
        let mut id = [0u8; QUERY_ID_LEN];
        id[QUERY_ID_LEN - 8..].copy_from_slice(&legacy_id.to_be_bytes());
        QueryId(id)
    }

    pub fn as_bytes(&self) -> &[u8; QUERY_ID_LEN] {
        &self.0
    }

    /// Formats the id as lowercase hex without a `0x` prefix.
    pub fn to_hex(&self) -> String {
        format_hex(&self.0)
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for QueryId {
    type Err = QueryError;

    /// Parses 64 hex digits, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        let bytes = parse_hex(hex).ok_or_else(|| QueryError::InvalidQueryId {
            reason: format!("{:?} is not valid hex", s),
        })?;
        QueryId::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for QueryId {
    type Error = QueryError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let id: [u8; QUERY_ID_LEN] = bytes.try_into().map_err(|_| QueryError::InvalidQueryId {
            reason: format!("expected {} bytes, got {}", QUERY_ID_LEN, bytes.len()),
        })?;
        Ok(QueryId(id))
    }
}

impl From<[u8; QUERY_ID_LEN]> for QueryId {
    fn from(bytes: [u8; QUERY_ID_LEN]) -> Self {
        QueryId(bytes)
    }
}

impl AsRef<[u8]> for QueryId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Computes Keccak-256 (the pre-standard SHA-3 padding variant).
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let hash = Keccak256::digest(input);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}

/// Formats bytes as lowercase hex.
pub fn format_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        s.push_str(&format!("{:02x}", byte));
    }
    s
}

/// Parses an even-length hex string. Accepts either case.
pub fn parse_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    s.as_bytes()
        .chunks(2)
        .map(|chunk| {
            let byte_str = std::str::from_utf8(chunk).ok()?;
            u8::from_str_radix(byte_str, 16).ok()
        })
        .collect()
}
