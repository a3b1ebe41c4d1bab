//! Stored Envelope Format
//!
//! Every value is wrapped before it reaches the backend:
//!
//! ```text
//! "<namespace>.<localKey>"  =>  {"expiry":1700000000000,"value":{"any":"json"}}
//!                               {"expiry":null,"value":42}
//! ```
//!
//! `expiry` is an absolute timestamp in milliseconds since the Unix epoch.
//! `null` means the entry never expires. Other writers sharing the backend may
//! store a fractional number (`1100.0000000000002`); it is read as the whole
//! millisecond it falls in, which keeps the same live/expired boundary for
//! integer clock readings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::time::Duration;

/// A value together with its optional expiry time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// When this entry expires (None = never expires)
    #[serde(default, deserialize_with = "deserialize_expiry")]
    pub expiry: Option<u64>,
    /// The caller's value
    pub value: Value,
}

impl Envelope {
    /// Creates an envelope that never expires.
    pub fn new(value: Value) -> Self {
        Self {
            expiry: None,
            value,
        }
    }

    /// Creates an envelope expiring `ttl` after `now_ms`.
    ///
    /// A zero TTL means "no expiry", matching how an unset TTL behaves.
    pub fn with_ttl(value: Value, now_ms: u64, ttl: Option<Duration>) -> Self {
        let expiry = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| now_ms.saturating_add(millis(ttl)));
        Self { expiry, value }
    }

    /// Checks if this envelope has expired at `now_ms`.
    ///
    /// An entry stays live up to and including its expiry millisecond.
    #[inline]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expiry.map(|exp| now_ms > exp).unwrap_or(false)
    }

    /// Serializes the envelope to its stored text form.
    pub fn encode(&self) -> String {
        // Serializing a struct of Option<u64> and Value cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parses stored text back into an envelope.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Accepts any JSON number (or null) as an expiry timestamp.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let expiry = match number.as_u64() {
        Some(ms) => ms,
        // Float casts saturate: negatives land on 0, overflow on u64::MAX
        None => number.as_f64().map(|ms| ms.floor() as u64).unwrap_or(0),
    };
    Ok(Some(expiry))
}

/// The outcome of looking a key up in the backend.
///
/// Collapsed to `Option` only at the public API boundary, so a stored `0`,
/// `""`, `false` or `null` is never confused with a missing entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Present and not expired
    Live(Value),
    /// Present but past its expiry, waiting for a sweep
    Expired,
    /// Missing, or present but not decodable as an envelope
    Absent,
}

impl Lookup {
    /// Classifies raw backend text at `now_ms`.
    pub fn classify(raw: Option<&str>, now_ms: u64) -> Self {
        let Some(raw) = raw else {
            return Lookup::Absent;
        };
        match Envelope::decode(raw) {
            Ok(envelope) if envelope.is_expired(now_ms) => Lookup::Expired,
            Ok(envelope) => Lookup::Live(envelope.value),
            Err(_) => Lookup::Absent,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Lookup::Live(_))
    }

    /// Returns the value if live.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Lookup::Live(value) => Some(value),
            Lookup::Expired | Lookup::Absent => None,
        }
    }
}
