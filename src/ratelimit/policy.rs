//! Rate limit policy parameters.

use std::fmt;
use std::time::Duration;

use crate::error::{KvDemoError, Result};

/// The admission policy of a sliding-window limiter: at most
/// `max_calls_in_period` requests per key within any trailing window of
/// `period_secs` seconds.
///
/// Both values are at least 1. [`RateLimitPolicy::new`] clamps smaller values
/// up to 1, [`RateLimitPolicy::strict`] rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateLimitPolicy {
    max_calls_in_period: u64,
    period_secs: u64,
}

impl RateLimitPolicy {
    /// Create a policy, raising any value below 1 to 1.
    ///
    /// A clamped policy cannot be told apart from one built with 1.
    pub fn new(max_calls_in_period: u64, period_secs: u64) -> Self {
        Self {
            max_calls_in_period: max_calls_in_period.max(1),
            period_secs: period_secs.max(1),
        }
    }

    /// Create a policy, failing if either value is below 1.
    pub fn strict(max_calls_in_period: u64, period_secs: u64) -> Result<Self> {
        if max_calls_in_period == 0 {
            return Err(KvDemoError::Config(
                "max_calls_in_period must be at least 1".to_string(),
            ));
        }
        if period_secs == 0 {
            return Err(KvDemoError::Config(
                "period_secs must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_calls_in_period,
            period_secs,
        })
    }

    /// Maximum admitted requests per window.
    pub fn max_calls_in_period(&self) -> u64 {
        self.max_calls_in_period
    }

    /// Window length in seconds.
    pub fn period_secs(&self) -> u64 {
        self.period_secs
    }

    /// Window length as a `Duration`.
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    /// The newest timestamp that has already left the window at `now`.
    ///
    /// Entries stamped at or before this value are expired.
    pub fn expiry_threshold(&self, now: i64) -> i64 {
        let period = i64::try_from(self.period_secs).unwrap_or(i64::MAX);
        now.saturating_sub(period)
    }
}

impl fmt::Display for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} per {}s", self.max_calls_in_period, self.period_secs)
    }
}
