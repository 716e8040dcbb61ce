//! Key-value backend abstraction
//!
//! The registry stores every entry as a single key with a TTL and answers
//! filtered queries by glob-style key scans. All coordination happens at
//! the backend's single-key atomicity; multi-key sequences are best effort.
//!
//! Two implementations: [`RedisStore`] for production and [`MemoryStore`]
//! for tests and dev mode.

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Backend failures, surfaced to the caller without retry
#[derive(Debug, Error)]
pub enum KvError {
    /// Could not reach the backend
    #[error("failed to connect to key-value backend: {0}")]
    Connect(String),

    /// A command against the backend failed
    #[error("key-value command failed: {0}")]
    Command(String),
}

/// Minimum capability set the registry needs from its backend
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value; `None` when the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Store a value with a per-key expiration
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), KvError>;

    /// Remove a key; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Return all keys matching a glob pattern (`*` wildcard)
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, KvError>;

    /// Increment a numeric counter, creating it at `delta` when absent.
    /// Used by the external report path, not by the registry core.
    async fn incr(&self, key: &str, delta: i64) -> Result<i64, KvError>;

    /// Liveness check against the backend
    async fn ping(&self) -> Result<(), KvError>;
}
