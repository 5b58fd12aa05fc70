//! Sliding-window rate limiter demo.
//!
//! Each client fires a burst of requests with fresh ids; only the first
//! `max_calls_in_period` of each burst get through. After waiting out the
//! window, a second round of bursts is admitted again.

use std::io::Write;
use std::sync::Arc;

use chrono::Local;
use tracing::info;
use uuid::Uuid;

use crate::config::RateLimitingConfig;
use crate::error::Result;
use crate::ratelimit::{Admission, Clock, EventLog, RateLimiter, RateLimitPolicy};
use crate::store::{RedisEventLog, Store};

/// Clients exercised by the demo, in order.
pub const CLIENTS: [&str; 2] = ["client1", "client2"];

/// A fresh request id.
pub fn request_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

/// Issue `calls` requests for `client`, printing one line per decision.
pub async fn burst<L, C, W>(
    limiter: &RateLimiter<L, C>,
    client: &str,
    calls: usize,
    out: &mut W,
) -> Result<Vec<bool>>
where
    L: EventLog,
    C: Clock,
    W: Write,
{
    let mut decisions = Vec::with_capacity(calls);
    for _ in 0..calls {
        let req = request_id();
        let stamp = Local::now().format("%H:%M:%S%.3f");
        let admitted = limiter.allow(client, &req).await?;
        let verdict = if admitted { "allowed" } else { "not allowed" };
        writeln!(out, "[{}] {} for {} {}", stamp, req, client, verdict)?;
        decisions.push(admitted);
    }
    Ok(decisions)
}

/// Run one round of bursts for every client in [`CLIENTS`].
pub async fn round<L, C, W>(
    limiter: &RateLimiter<L, C>,
    calls: usize,
    out: &mut W,
) -> Result<Vec<Vec<bool>>>
where
    L: EventLog,
    C: Clock,
    W: Write,
{
    let mut rounds = Vec::with_capacity(CLIENTS.len());
    for client in CLIENTS {
        rounds.push(burst(limiter, client, calls, out).await?);
    }
    Ok(rounds)
}

/// Run the demo against the store.
pub async fn run(store: Store, config: &RateLimitingConfig) -> Result<()> {
    let admission = if config.atomic {
        Admission::Atomic
    } else {
        Admission::Sequential
    };
    let policy = RateLimitPolicy::new(config.max_calls_in_period, config.period_secs);
    let limiter = RateLimiter::new(Arc::new(RedisEventLog::new(store)), policy)
        .with_admission(admission);

    info!(policy = %policy, admission = ?admission, "Running rate limiter demo");

    let mut out = std::io::stdout();
    round(&limiter, config.burst, &mut out).await?;
    tokio::time::sleep(policy.period()).await;
    round(&limiter, config.burst, &mut out).await?;
    Ok(())
}
