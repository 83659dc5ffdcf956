//! Record identifiers.
//!
//! Records are addressed by a 24-character hexadecimal token (the object-id
//! shape used by document databases). Identifiers are minted from a UUIDv7 so
//! they sort roughly by creation time.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Length of an identifier in hexadecimal characters.
pub const RECORD_ID_LEN: usize = 24;

/// Identifier of a persisted record (item or supplier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Mint a new identifier.
    ///
    /// Takes the first 12 bytes of a UUIDv7: the 48-bit millisecond timestamp
    /// followed by random bits.
    pub fn new() -> Self {
        let uuid = Uuid::now_v7();
        let hex = uuid.as_bytes()[..RECORD_ID_LEN / 2]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `raw` has the identifier syntax (24 hex characters).
    pub fn is_valid(raw: &str) -> bool {
        raw.len() == RECORD_ID_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("id", s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse an identifier supplied under `field` (path parameter or payload field).
///
/// Malformed identifiers are rejected as a validation failure naming `field`,
/// so callers can reject them before any repository call is attempted.
pub fn parse_id(field: &str, raw: &str) -> Result<RecordId, DomainError> {
    let raw = raw.trim();
    if !RecordId::is_valid(raw) {
        return Err(DomainError::invalid(
            field,
            format!("{field} must be a valid identifier"),
        ));
    }
    Ok(RecordId(raw.to_ascii_lowercase()))
}
