// ============================================
// File: crates/stls-common/src/time.rs
// ============================================
//! # Time Utilities
//!
//! Unix timestamps for certificate validity windows.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Unix timestamp in seconds.
///
/// # Example
/// ```
/// use stls_common::time::Timestamp;
///
/// let now = Timestamp::now();
/// let start = Timestamp::from_secs(now.as_secs() - 60);
/// let end = Timestamp::from_secs(now.as_secs() + 60);
/// assert!(now.is_within(start, end));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from Unix seconds.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Creates a timestamp for the current time.
    ///
    /// A clock set before the Unix epoch reads as the epoch itself.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self(secs)
    }

    /// Returns the Unix timestamp in seconds.
    #[must_use]
    pub const fn as_secs(&self) -> i64 {
        self.0
    }

    /// Checks `not_before <= self <= not_after`.
    #[must_use]
    pub fn is_within(&self, not_before: Self, not_after: Self) -> bool {
        not_before <= *self && *self <= not_after
    }

    /// Returns a timestamp shifted by `secs` (saturating).
    #[must_use]
    pub const fn offset(&self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl From<i64> for Timestamp {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================
// Tests
// ============================================
