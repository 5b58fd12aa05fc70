//! Access to the external Redis-protocol key-value store.

mod connection;
mod event_log;

pub use connection::{Store, MAX_DB, MIN_DB};
pub use event_log::RedisEventLog;
