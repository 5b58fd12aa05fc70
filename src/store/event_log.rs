//! Store-backed event log.
//!
//! Each key's request window is a sorted set whose members are request ids
//! and whose scores are request timestamps in seconds:
//!
//! - trim: `ZREMRANGEBYSCORE key -inf threshold`
//! - count: `ZCARD key`
//! - insert: `ZADD key timestamp request_id`
//!
//! `try_admit` runs the three commands inside a server-side Lua script so the
//! check-and-insert is atomic. When the server answers that it does not know
//! the scripting commands, the log warns once and from then on issues the
//! three commands one after another, which is not atomic.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use redis::{AsyncCommands, ErrorKind, RedisError, Script};
use tracing::{trace, warn};

use super::connection::Store;
use crate::error::{KvDemoError, Result};
use crate::ratelimit::EventLog;

/// KEYS[1] = window key; ARGV = threshold, max calls, now, request id.
const ADMIT_SCRIPT: &str = r#"
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
if redis.call('ZCARD', KEYS[1]) < tonumber(ARGV[2]) then
    redis.call('ZADD', KEYS[1], ARGV[3], ARGV[4])
    return 1
end
return 0
"#;

/// An [`EventLog`] kept in sorted sets of the external store.
pub struct RedisEventLog {
    store: Store,
    key_prefix: String,
    admit: Script,
    scripting: AtomicBool,
}

impl RedisEventLog {
    /// Create a log that uses client keys unchanged.
    pub fn new(store: Store) -> Self {
        Self::with_prefix(store, "")
    }

    /// Create a log that stores each window under `prefix` + key.
    pub fn with_prefix(store: Store, prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: prefix.into(),
            admit: Script::new(ADMIT_SCRIPT),
            scripting: AtomicBool::new(true),
        }
    }

    /// Whether `try_admit` still uses the server-side script.
    pub fn scripting_available(&self) -> bool {
        self.scripting.load(Ordering::Relaxed)
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn admit_scripted(
        &self,
        key: &str,
        request_id: &str,
        now: i64,
        threshold: i64,
        max_calls: u64,
    ) -> std::result::Result<bool, RedisError> {
        let mut conn = self.store.connection();
        let admitted: i64 = self
            .admit
            .key(self.key(key))
            .arg(threshold)
            .arg(max_calls)
            .arg(now)
            .arg(request_id)
            .invoke_async(&mut conn)
            .await?;
        Ok(admitted == 1)
    }

    async fn admit_in_steps(
        &self,
        key: &str,
        request_id: &str,
        now: i64,
        threshold: i64,
        max_calls: u64,
    ) -> Result<bool> {
        self.trim_before(key, threshold).await?;
        if self.count(key).await? >= max_calls {
            return Ok(false);
        }
        self.insert(key, request_id, now).await?;
        Ok(true)
    }
}

/// True when the server rejected a command it does not implement.
fn is_unknown_command(err: &RedisError) -> bool {
    err.kind() == ErrorKind::ResponseError
        && err.to_string().to_ascii_lowercase().contains("unknown command")
}

#[async_trait]
impl EventLog for RedisEventLog {
    async fn trim_before(&self, key: &str, threshold: i64) -> Result<()> {
        let mut conn = self.store.connection();
        let removed: u64 = conn.zrembyscore(self.key(key), "-inf", threshold).await?;
        trace!(key = %key, removed = removed, "Window trimmed");
        Ok(())
    }

    async fn count(&self, key: &str) -> Result<u64> {
        let mut conn = self.store.connection();
        Ok(conn.zcard(self.key(key)).await?)
    }

    async fn insert(&self, key: &str, request_id: &str, timestamp: i64) -> Result<()> {
        let mut conn = self.store.connection();
        let _: () = conn.zadd(self.key(key), request_id, timestamp).await?;
        Ok(())
    }

    async fn try_admit(
        &self,
        key: &str,
        request_id: &str,
        now: i64,
        threshold: i64,
        max_calls: u64,
    ) -> Result<bool> {
        if self.scripting_available() {
            match self
                .admit_scripted(key, request_id, now, threshold, max_calls)
                .await
            {
                Ok(admitted) => return Ok(admitted),
                Err(e) if is_unknown_command(&e) => {
                    if self.scripting.swap(false, Ordering::Relaxed) {
                        warn!(
                            error = %e,
                            "Store has no scripting support, falling back to non-atomic admission"
                        );
                    }
                }
                Err(e) => return Err(KvDemoError::Store(e)),
            }
        }
        self.admit_in_steps(key, request_id, now, threshold, max_calls)
            .await
    }
}
