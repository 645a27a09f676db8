//! Record identity with an explicit pending/persisted distinction.
//!
//! The backend assigns small integer IDs. Records created in the UI before
//! they are saved carry a client-generated millisecond timestamp instead,
//! which is always above `PENDING_THRESHOLD`. On the wire both are bare
//! numbers; the tag exists only inside this crate so that code never has to
//! compare magnitudes itself.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// IDs above this are client-generated placeholders (millisecond timestamps).
pub const PENDING_THRESHOLD: i64 = 1_000_000_000_000;

/// Identity of a route or location record.
///
/// A `Pending` ID is never mutated into a `Persisted` one in place; the
/// server-assigned ID only arrives via a fresh fetch after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordId {
    /// Client-generated placeholder, not yet known to the backend.
    Pending(i64),
    /// Backend-assigned ID.
    Persisted(i64),
}

impl RecordId {
    /// Generate a fresh placeholder ID from the current time.
    pub fn new_pending() -> Self {
        RecordId::Pending(Utc::now().timestamp_millis())
    }

    /// Classify a raw wire ID by magnitude.
    pub fn from_raw(raw: i64) -> Self {
        if raw > PENDING_THRESHOLD {
            RecordId::Pending(raw)
        } else {
            RecordId::Persisted(raw)
        }
    }

    /// The underlying number, whatever its state.
    pub fn raw(&self) -> i64 {
        match *self {
            RecordId::Pending(id) | RecordId::Persisted(id) => id,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RecordId::Pending(_))
    }

    /// The server-assigned ID, if this record has one.
    pub fn as_persisted(&self) -> Option<i64> {
        match *self {
            RecordId::Persisted(id) => Some(id),
            RecordId::Pending(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.raw())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(RecordId::from_raw(raw))
    }
}
