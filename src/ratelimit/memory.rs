//! In-memory event log.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use super::backend::EventLog;
use crate::error::Result;

/// An [`EventLog`] kept in process memory.
///
/// Each key maps to its request ids and their timestamps. Windows that
/// become empty after a trim are dropped, mirroring how the store deletes
/// empty sorted sets.
///
/// `try_admit` runs under the key's shard lock, so it is atomic with
/// respect to other callers on the same log.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    windows: DashMap<String, HashMap<String, i64>>,
}

impl MemoryEventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for `key`, oldest first. Ties are ordered by request id.
    pub fn entries(&self, key: &str) -> Vec<(String, i64)> {
        let mut entries: Vec<(String, i64)> = self
            .windows
            .get(key)
            .map(|window| {
                window
                    .iter()
                    .map(|(id, ts)| (id.clone(), *ts))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    /// Number of keys with at least one retained entry.
    pub fn key_count(&self) -> usize {
        self.windows.len()
    }

    /// Drop every window.
    pub fn clear(&self) {
        self.windows.clear();
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn trim_before(&self, key: &str, threshold: i64) -> Result<()> {
        if let Some(mut window) = self.windows.get_mut(key) {
            window.retain(|_, ts| *ts > threshold);
        }
        self.windows.remove_if(key, |_, window| window.is_empty());
        Ok(())
    }

    async fn count(&self, key: &str) -> Result<u64> {
        Ok(self
            .windows
            .get(key)
            .map(|window| window.len() as u64)
            .unwrap_or(0))
    }

    async fn insert(&self, key: &str, request_id: &str, timestamp: i64) -> Result<()> {
        self.windows
            .entry(key.to_string())
            .or_default()
            .insert(request_id.to_string(), timestamp);
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
        let mut window = self.windows.entry(key.to_string()).or_default();
        window.retain(|_, ts| *ts > threshold);

        let count = window.len() as u64;
        trace!(key = %key, count = count, "Window trimmed");

        if count < max_calls {
            window.insert(request_id.to_string(), now);
            return Ok(true);
        }
        Ok(false)
    }
}
