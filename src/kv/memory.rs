//! In-memory key-value store
//!
//! DashMap-backed implementation with lazy TTL expiry and Redis-style glob
//! matching. Backs tests and dev mode, where running without a Redis
//! instance is more useful than failing to start.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};

use super::{KvError, KvStore};

#[derive(Debug, Clone)]
struct StoredValue {
    value: Vec<u8>,
    /// `None` for counters created by `incr`, which have no expiry
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// In-memory implementation of [`KvStore`]
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries; returns how many were removed
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, v| !v.is_expired(now));
        before - self.entries.len()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let now = Instant::now();
        if let Some(stored) = self.entries.get(key) {
            if !stored.is_expired(now) {
                return Ok(Some(stored.value.clone()));
            }
        }
        // Expired entries are removed lazily on read
        self.entries.remove_if(key, |_, v| v.is_expired(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), KvError> {
        self.entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_vec(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.value().is_expired(now) && glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect();
        // DashMap iteration order is arbitrary; sort for stable pagination
        keys.sort();
        Ok(keys)
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<i64, KvError> {
        let now = Instant::now();
        let mut slot = self.entries.entry(key.to_string()).or_insert(StoredValue {
            value: b"0".to_vec(),
            expires_at: None,
        });
        if slot.is_expired(now) {
            slot.value = b"0".to_vec();
            slot.expires_at = None;
        }
        let current: i64 = std::str::from_utf8(&slot.value)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| KvError::Command(format!("key {key} holds a non-integer value")))?;
        let next = current + delta;
        slot.value = next.to_string().into_bytes();
        Ok(next)
    }

    async fn ping(&self) -> Result<(), KvError> {
        Ok(())
    }
}

/// Spawn a background task that periodically drops expired entries, so a
/// long-lived dev-mode process does not accumulate dead keys
pub fn spawn_sweep_task(store: Arc<MemoryStore>) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(60);
        loop {
            tokio::time::sleep(interval).await;
            let removed = store.sweep();
            if removed > 0 {
                debug!("memory store sweep removed {} expired entries", removed);
            }
        }
    });
    info!("Memory store sweep task started");
}

/// Redis-style glob match supporting `*` (any run of characters) and `?`
/// (any single character)
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            // Backtrack: let the last star absorb one more character
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_literal_and_wildcards() {
        assert!(glob_match("abc", "abc"));
        assert!(!glob_match("abc", "abd"));
        assert!(glob_match("a*c", "abbbc"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "ac"));
    }

    #[test]
    fn test_glob_segment_patterns() {
        let key = "u1:api:gw:healthy:aws:us-east-1:us-east-1a:vpc-1:sn-1:i-1:1.2.3";
        assert!(glob_match("u1:*:*:*:*:*:*:*:*:*:*", key));
        assert!(glob_match("*:*:gw:*:*:*:*:*:*:*:*", key));
        assert!(glob_match("*:*:gw:healthy:*:*:*:*:*:*:*", key));
        assert!(!glob_match("*:*:db:*:*:*:*:*:*:*:*", key));
        // Too many fixed segments for the key
        assert!(!glob_match("u1:*:*:*:*:*:*:*:*:*:*:*:extra", key));
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        store
            .set("k", b"v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let store = MemoryStore::new();
        store
            .set("k", b"v", Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.scan("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_is_sorted() {
        let store = MemoryStore::new();
        for key in ["b:1", "a:1", "c:1"] {
            store.set(key, b"{}", Duration::from_secs(60)).await.unwrap();
        }
        assert_eq!(store.scan("*:1").await.unwrap(), vec!["a:1", "b:1", "c:1"]);
    }

    #[tokio::test]
    async fn test_incr() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("counter", 1).await.unwrap(), 1);
        assert_eq!(store.incr("counter", 2).await.unwrap(), 3);
    }
}
