//! Sliding-window rate limiter.

use std::sync::Arc;
use tracing::{debug, trace};

use super::backend::EventLog;
use super::clock::{Clock, SystemClock};
use super::policy::RateLimitPolicy;
use crate::error::Result;

/// How the limiter drives the event log for one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Admission {
    /// Trim, count and insert as three separate log calls.
    ///
    /// Concurrent callers on the same key may both read a stale count and
    /// both be admitted. Only suitable for a single writer per key.
    Sequential,
    /// A single [`EventLog::try_admit`] call.
    #[default]
    Atomic,
}

/// A sliding-window rate limiter.
///
/// The limiter holds only its policy; every request window lives in the
/// injected [`EventLog`]. A key may make at most
/// `policy.max_calls_in_period()` admitted requests within any trailing
/// window of `policy.period_secs()` seconds. The window slides continuously:
/// a request stamped `t` stops counting once `now >= t + period`.
pub struct RateLimiter<L, C = SystemClock> {
    /// Per-key request windows
    log: Arc<L>,
    policy: RateLimitPolicy,
    clock: C,
    admission: Admission,
}

impl<L: EventLog> RateLimiter<L, SystemClock> {
    /// Create a limiter over `log` using the system clock.
    pub fn new(log: Arc<L>, policy: RateLimitPolicy) -> Self {
        Self {
            log,
            policy,
            clock: SystemClock::new(),
            admission: Admission::default(),
        }
    }

    /// Create a limiter from raw limits. Values below 1 are raised to 1.
    pub fn with_limits(log: Arc<L>, max_calls_in_period: u64, period_secs: u64) -> Self {
        Self::new(log, RateLimitPolicy::new(max_calls_in_period, period_secs))
    }
}

impl<L: EventLog, C: Clock> RateLimiter<L, C> {
    /// Replace the clock.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> RateLimiter<L, C2> {
        RateLimiter {
            log: self.log,
            policy: self.policy,
            clock,
            admission: self.admission,
        }
    }

    /// Choose how admission checks are issued against the log.
    pub fn with_admission(mut self, admission: Admission) -> Self {
        self.admission = admission;
        self
    }

    /// Decide whether the request `request_id` from `key` is admitted.
    ///
    /// Entries that have left the window are trimmed first, on every call.
    /// If fewer than `max_calls_in_period` entries remain the request is
    /// recorded at the current second and `true` is returned; otherwise
    /// nothing is recorded and `false` is returned. Log failures are
    /// returned unchanged and never retried.
    pub async fn allow(&self, key: &str, request_id: &str) -> Result<bool> {
        let now = self.clock.now_secs();
        let threshold = self.policy.expiry_threshold(now);
        let max_calls = self.policy.max_calls_in_period();

        trace!(
            key = %key,
            request_id = %request_id,
            now = now,
            admission = ?self.admission,
            "Checking rate limit"
        );

        let admitted = match self.admission {
            Admission::Atomic => {
                self.log
                    .try_admit(key, request_id, now, threshold, max_calls)
                    .await?
            }
            Admission::Sequential => {
                self.log.trim_before(key, threshold).await?;
                if self.log.count(key).await? < max_calls {
                    self.log.insert(key, request_id, now).await?;
                    true
                } else {
                    false
                }
            }
        };

        if !admitted {
            debug!(
                key = %key,
                request_id = %request_id,
                policy = %self.policy,
                "Rate limit exceeded"
            );
        }

        Ok(admitted)
    }

    /// How many more requests `key` could make right now.
    ///
    /// Trims expired entries as a side effect.
    pub async fn remaining(&self, key: &str) -> Result<u64> {
        let threshold = self.policy.expiry_threshold(self.clock.now_secs());
        self.log.trim_before(key, threshold).await?;
        let count = self.log.count(key).await?;
        Ok(self.policy.max_calls_in_period().saturating_sub(count))
    }

    /// The effective (clamped) policy.
    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// How `allow` combines trim, count and insert.
    pub fn admission(&self) -> Admission {
        self.admission
    }

    /// The event log behind this limiter.
    pub fn log(&self) -> &Arc<L> {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::clock::MockClock;
    use crate::ratelimit::memory::MemoryEventLog;
    use tokio_test::assert_ok;

    const START: i64 = 1_700_000_000;

    fn test_limiter(
        max_calls: u64,
        period: u64,
        admission: Admission,
    ) -> (RateLimiter<MemoryEventLog, MockClock>, MockClock) {
        let clock = MockClock::new(START);
        let limiter = RateLimiter::with_limits(Arc::new(MemoryEventLog::new()), max_calls, period)
            .with_clock(clock.clone())
            .with_admission(admission);
        (limiter, clock)
    }

    async fn burst(
        limiter: &RateLimiter<MemoryEventLog, MockClock>,
        key: &str,
        calls: usize,
    ) -> Vec<bool> {
        let mut results = Vec::with_capacity(calls);
        for _ in 0..calls {
            let request_id = format!("req-{}", uuid::Uuid::new_v4());
            results.push(limiter.allow(key, &request_id).await.unwrap());
        }
        results
    }

    fn expected(admitted: usize, total: usize) -> Vec<bool> {
        (0..total).map(|i| i < admitted).collect()
    }

    #[tokio::test]
    async fn test_defaults() {
        let limiter = RateLimiter::with_limits(Arc::new(MemoryEventLog::new()), 5, 3);
        assert_eq!(limiter.policy(), RateLimitPolicy::new(5, 3));
        assert_eq!(limiter.admission(), Admission::Atomic);
    }

    #[tokio::test]
    async fn test_burst_then_window_expiry() {
        for admission in [Admission::Atomic, Admission::Sequential] {
            let (limiter, clock) = test_limiter(5, 3, admission);

            assert_eq!(burst(&limiter, "client1", 12).await, expected(5, 12));

            clock.advance(4);
            assert_eq!(burst(&limiter, "client1", 12).await, expected(5, 12));
        }
    }

    #[tokio::test]
    async fn test_clients_have_separate_windows() {
        let (limiter, _clock) = test_limiter(5, 3, Admission::Atomic);

        assert_eq!(burst(&limiter, "client1", 12).await, expected(5, 12));
        assert_eq!(burst(&limiter, "client2", 12).await, expected(5, 12));
    }

    #[tokio::test]
    async fn test_same_instant_saturation() {
        let (limiter, _clock) = test_limiter(3, 10, Admission::Sequential);

        for i in 0..3 {
            assert!(assert_ok!(limiter.allow("k", &format!("r{}", i)).await));
        }
        assert!(!assert_ok!(limiter.allow("k", "fresh").await));
        assert_eq!(limiter.log().count("k").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let (limiter, clock) = test_limiter(1, 3, Admission::Atomic);

        assert!(limiter.allow("k", "first").await.unwrap());

        // Still inside the window two seconds later
        clock.advance(2);
        assert!(!limiter.allow("k", "second").await.unwrap());

        // Exactly one period later the first entry has expired
        clock.advance(1);
        assert!(limiter.allow("k", "third").await.unwrap());
    }

    #[tokio::test]
    async fn test_window_slides_instead_of_resetting() {
        let (limiter, clock) = test_limiter(2, 10, Admission::Atomic);

        assert!(limiter.allow("k", "a").await.unwrap());
        clock.advance(5);
        assert!(limiter.allow("k", "b").await.unwrap());
        assert!(!limiter.allow("k", "c").await.unwrap());

        // "a" expires at +10, "b" is still counted
        clock.advance(5);
        assert!(limiter.allow("k", "d").await.unwrap());
        assert!(!limiter.allow("k", "e").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejection_still_trims() {
        let (limiter, clock) = test_limiter(2, 3, Admission::Sequential);

        assert!(limiter.allow("k", "old").await.unwrap());
        clock.advance(2);
        assert!(limiter.allow("k", "new").await.unwrap());
        assert!(!limiter.allow("k", "rejected").await.unwrap());

        clock.advance(1);
        // "old" is trimmed, leaving room for exactly one more
        assert!(limiter.allow("k", "after").await.unwrap());
        let ids: Vec<String> = limiter
            .log()
            .entries("k")
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["new", "after"]);
    }

    #[tokio::test]
    async fn test_repeated_request_id_is_one_entry() {
        let (limiter, clock) = test_limiter(3, 10, Admission::Atomic);

        assert!(limiter.allow("k", "same").await.unwrap());
        clock.advance(1);
        assert!(limiter.allow("k", "same").await.unwrap());

        assert_eq!(limiter.log().entries("k"), vec![("same".to_string(), START + 1)]);
        assert_eq!(limiter.remaining("k").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_zero_max_calls_behaves_like_one() {
        let (zero, _) = test_limiter(0, 0, Admission::Atomic);
        let (one, _) = test_limiter(1, 1, Admission::Atomic);

        assert_eq!(zero.policy(), one.policy());
        assert_eq!(burst(&zero, "k", 3).await, burst(&one, "k", 3).await);
        assert_eq!(burst(&zero, "k2", 3).await, expected(1, 3));
    }

    #[tokio::test]
    async fn test_retained_entries_never_exceed_max() {
        let (limiter, clock) = test_limiter(4, 5, Admission::Sequential);

        for step in 0..40 {
            let request_id = format!("req-{}", step);
            limiter.allow("k", &request_id).await.unwrap();

            let now = START + (step / 3) as i64;
            let live = limiter
                .log()
                .entries("k")
                .into_iter()
                .filter(|(_, ts)| *ts > now - 5)
                .count();
            assert!(live <= 4, "step {} retained {} live entries", step, live);

            if step % 3 == 2 {
                clock.advance(1);
            }
        }
    }

    #[tokio::test]
    async fn test_remaining() {
        let (limiter, clock) = test_limiter(5, 3, Admission::Atomic);

        assert_eq!(limiter.remaining("k").await.unwrap(), 5);
        burst(&limiter, "k", 2).await;
        assert_eq!(limiter.remaining("k").await.unwrap(), 3);
        burst(&limiter, "k", 10).await;
        assert_eq!(limiter.remaining("k").await.unwrap(), 0);

        clock.advance(3);
        assert_eq!(limiter.remaining("k").await.unwrap(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_atomic_admission_under_concurrency() {
        let (limiter, _clock) = test_limiter(5, 60, Admission::Atomic);
        let limiter = Arc::new(limiter);

        let tasks = (0..64).map(|i| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.allow("shared", &format!("req-{}", i)).await })
        });

        let admitted = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .filter(|admitted| *admitted)
            .count();

        assert_eq!(admitted, 5);
        assert_eq!(limiter.log().count("shared").await.unwrap(), 5);
    }
}
