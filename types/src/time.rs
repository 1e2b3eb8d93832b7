//! Timestamp type used throughout the platform.
//!
//! Timestamps are Unix epoch milliseconds (UTC). Millisecond resolution
//! matters: the cast time is part of the receipt digest input, and the
//! finer granularity is what makes receipt hashes collision-free in
//! practice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampMs(u64);

impl TimestampMs {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Get the current system time as a `TimestampMs`.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis() as u64;
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Saturating addition of a millisecond offset.
    pub fn plus_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Saturating subtraction of a millisecond offset.
    pub fn minus_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_sub(millis))
    }

    /// Whether `self` lies within `[start, end]`, inclusive on both ends.
    pub fn within(&self, start: TimestampMs, end: TimestampMs) -> bool {
        *self >= start && *self <= end
    }
}

impl fmt::Display for TimestampMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_is_inclusive() {
        let start = TimestampMs::new(1000);
        let end = TimestampMs::new(2000);
        assert!(start.within(start, end));
        assert!(end.within(start, end));
        assert!(TimestampMs::new(1500).within(start, end));
        assert!(!TimestampMs::new(999).within(start, end));
        assert!(!TimestampMs::new(2001).within(start, end));
    }

    #[test]
    fn from_secs_scales() {
        assert_eq!(TimestampMs::from_secs(3).as_millis(), 3000);
    }

    #[test]
    fn plus_minus_roundtrip() {
        let t = TimestampMs::new(5000);
        assert_eq!(t.plus_millis(100).minus_millis(100), t);
    }
}
