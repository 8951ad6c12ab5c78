//! In-process cache backend

use std::io;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

use super::ContentCache;

#[derive(Debug, Clone)]
struct MemoryEntry {
    data: Value,
    expires_at: Instant,
}

/// Concurrent in-memory cache, discarded when the process exits
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including any that expired since the last write
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContentCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        if self
            .entries
            .remove_if(key, |_, entry| entry.expires_at <= now)
            .is_some()
        {
            return None;
        }
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    fn set(&self, key: &str, value: &Value, ttl: Duration) -> io::Result<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "cache lifetime out of range")
        })?;

        // Sweep expired entries so keys that are never read again do not pile up
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                data: value.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete_matching(&self, prefix: &str) -> io::Result<usize> {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let matched = key.starts_with(prefix);
            if matched {
                removed += 1;
            }
            !matched
        });
        Ok(removed)
    }
}
