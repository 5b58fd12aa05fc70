//! kvdemos - usage-pattern demos for a Redis-protocol key-value store
//!
//! The centerpiece is a sliding-window rate limiter whose per-key request
//! windows live in an injected event log (sorted sets in the store, or an
//! in-memory log for tests). Alongside it sit a leaderboard, a string
//! throughput benchmark and a role-based permission checker.

pub mod cli;
pub mod config;
pub mod demos;
pub mod error;
pub mod ratelimit;
pub mod security;
pub mod store;
