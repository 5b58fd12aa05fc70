//! Scripted usage-pattern demos against the key-value store.

pub mod leaderboard;
pub mod perf_strings;
pub mod rate_limiter;
pub mod role_security;
