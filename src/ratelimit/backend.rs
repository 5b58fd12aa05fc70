//! Event log trait for abstracting the storage behind the rate limiter.

use async_trait::async_trait;

use crate::error::Result;

/// An ordered log of `(request_id, timestamp)` entries per key.
///
/// Entries are unique by request id within a key and ordered by timestamp.
/// Implementations own all mutable rate limiting state, which keeps the
/// `RateLimiter` itself stateless and lets tests swap in an in-memory log.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Remove every entry for `key` whose timestamp is `<= threshold`.
    async fn trim_before(&self, key: &str, threshold: i64) -> Result<()>;

    /// Number of entries currently retained for `key`, `0` if the key is unknown.
    async fn count(&self, key: &str) -> Result<u64>;

    /// Add an entry for `key`. An existing `request_id` has its timestamp updated.
    async fn insert(&self, key: &str, request_id: &str, timestamp: i64) -> Result<()>;

    /// Trim, count and conditionally insert in one step.
    ///
    /// Returns `true` if the entry was inserted. The default implementation
    /// composes the three calls above and is therefore only safe with a single
    /// writer per key; implementations that can run the sequence atomically
    /// should override it.
    async fn try_admit(
        &self,
        key: &str,
        request_id: &str,
        now: i64,
        threshold: i64,
        max_calls: u64,
    ) -> Result<bool> {
        self.trim_before(key, threshold).await?;
        if self.count(key).await? < max_calls {
            self.insert(key, request_id, now).await?;
            return Ok(true);
        }
        Ok(false)
    }
}
