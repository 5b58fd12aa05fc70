//! Wall-clock sources for the rate limiter.
//!
//! The limiter works in whole seconds since the Unix epoch. `SystemClock`
//! reads the real time; `MockClock` lets tests move time explicitly.

use std::sync::Arc;

use parking_lot::Mutex;

/// A source of the current time in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Current time, truncated to seconds.
    fn now_secs(&self) -> i64;
}

/// System clock backed by `chrono::Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Manually driven clock.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the limiter.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<i64>>,
}

impl MockClock {
    /// Create a mock clock starting at `start` seconds.
    pub fn new(start: i64) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        *self.current.lock() += secs;
    }

    /// Set the clock to `secs`.
    pub fn set(&self, secs: i64) {
        *self.current.lock() = secs;
    }
}

impl Clock for MockClock {
    fn now_secs(&self) -> i64 {
        *self.current.lock()
    }
}
