//! Key-value caches with per-entry TTL
//!
//! The content client only needs get, set-with-TTL and delete-by-prefix, so any
//! backend implementing [`ContentCache`] can be plugged in. Two are provided: a
//! filesystem cache under the XDG cache directory and an in-process map.

mod file;
mod memory;

use std::io;
use std::time::Duration;

use serde_json::Value;

pub use file::FileCache;
pub use memory::MemoryCache;

/// Storage for cached API responses
pub trait ContentCache: Send + Sync {
    /// Returns the value under `key`, or `None` if it is missing or has expired
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key` for `ttl`
    fn set(&self, key: &str, value: &Value, ttl: Duration) -> io::Result<()>;

    /// Removes every entry whose key starts with `prefix` and returns how many were removed
    fn delete_matching(&self, prefix: &str) -> io::Result<usize>;
}
