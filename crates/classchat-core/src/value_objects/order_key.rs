//! Order key - the store-assigned position of a message in a channel log
//!
//! Structure:
//! - Bits 63-12: milliseconds since custom epoch, as observed by the store
//! - Bits 11-0:  tie-break counter for appends arriving in the same millisecond
//!
//! Keys are strictly increasing per channel. The generator is not shared
//! between channels; each channel log owns one and calls it inside its
//! append critical section, so no atomics are needed and ties are broken
//! purely by arrival order at the store.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A message's position in its channel log (64-bit, totally ordered).
///
/// Doubles as the subscription cursor: `subscribe(channel, key)` resumes
/// strictly after `key`. `OrderKey::ZERO` reads a channel from the beginning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OrderKey(u64);

impl OrderKey {
    /// Custom epoch: 2024-01-01 00:00:00 UTC (milliseconds)
    pub const EPOCH: u64 = 1_704_067_200_000;

    /// The cursor that precedes every assigned key
    pub const ZERO: Self = Self(0);

    /// Create an OrderKey from a raw u64 value
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the inner u64 value
    #[inline]
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Check if this is the zero cursor (precedes all messages)
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Extract the store-observed timestamp (milliseconds since Unix epoch)
    #[inline]
    pub fn timestamp_millis(&self) -> u64 {
        (self.0 >> 12) + Self::EPOCH
    }

    /// Extract the same-millisecond tie-break counter
    #[inline]
    pub fn tie_break(&self) -> u16 {
        (self.0 & 0xFFF) as u16
    }

    /// Parse from the string wire representation
    pub fn parse(s: &str) -> Result<Self, OrderKeyParseError> {
        s.parse::<u64>()
            .map(OrderKey)
            .map_err(|_| OrderKeyParseError::InvalidFormat)
    }
}

/// Error when parsing an OrderKey from a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OrderKeyParseError {
    #[error("invalid order key format")]
    InvalidFormat,
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderKey {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<OrderKey> for u64 {
    fn from(key: OrderKey) -> Self {
        key.0
    }
}

impl std::str::FromStr for OrderKey {
    type Err = OrderKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderKey::parse(s)
    }
}

// Serialize as string for JSON (JavaScript BigInt safety)
impl Serialize for OrderKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for OrderKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct OrderKeyVisitor;

        impl Visitor<'_> for OrderKeyVisitor {
            type Value = OrderKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing an order key")
            }

            fn visit_u64<E>(self, value: u64) -> Result<OrderKey, E>
            where
                E: de::Error,
            {
                Ok(OrderKey(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<OrderKey, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(OrderKey)
                    .map_err(|_| de::Error::custom("invalid order key string"))
            }
        }

        deserializer.deserialize_any(OrderKeyVisitor)
    }
}

/// Per-channel order key generator.
///
/// Each call produces a key strictly greater than the previous one, even if
/// the wall clock stalls or steps backwards: the candidate derived from the
/// clock is bumped to `last + 1` whenever it does not exceed the last key.
/// Callers must serialize access (the channel store invokes this under its
/// per-channel lock), which is what makes arrival order the tie-breaker.
#[derive(Debug, Default)]
pub struct OrderKeyGenerator {
    last: u64,
}

impl OrderKeyGenerator {
    /// Create a fresh generator
    #[must_use]
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Resume a generator so new keys sort after an existing log tail
    #[must_use]
    pub fn resume_after(last: OrderKey) -> Self {
        Self {
            last: last.into_inner(),
        }
    }

    /// Generate the next key
    pub fn next_key(&mut self) -> OrderKey {
        let candidate = (Self::clock_millis().saturating_sub(OrderKey::EPOCH)) << 12;
        let raw = if candidate > self.last {
            candidate
        } else {
            self.last + 1
        };
        self.last = raw;
        OrderKey(raw)
    }

    /// The last key handed out, if any
    #[must_use]
    pub fn last_key(&self) -> Option<OrderKey> {
        (self.last != 0).then_some(OrderKey(self.last))
    }

    #[inline]
    fn clock_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
