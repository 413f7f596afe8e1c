//! Time-boxed memoization of retrieval results.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// A cached value with an optional absolute expiry.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    /// `None` means the entry never expires.
    expires_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// A concurrent map from string keys to TTL-bounded values.
///
/// The map is guarded by a single `tokio::sync::RwLock`, which gives the
/// two guarantees the retrieval path needs: last-writer-wins on key
/// collision, and readers never observe a half-written entry.
///
/// Expiry is enforced lazily at read time only — there is no background
/// sweep, so an expired entry that is never read again occupies memory
/// until [`clear`](QueryCache::clear) or [`remove`](QueryCache::remove)
/// touches it. That is a documented limitation, not a defect.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use ragkit::QueryCache;
///
/// let cache: QueryCache<Vec<String>> = QueryCache::new();
/// cache.set("key", vec!["hit".to_string()], Some(Duration::from_secs(60))).await;
/// assert!(cache.get("key").await.is_some());
/// ```
#[derive(Debug, Default)]
pub struct QueryCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> QueryCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Look up a key, evicting the entry if its TTL has passed.
    ///
    /// Returns `None` for absent and expired entries alike.
    pub async fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: evict under the write lock. Another writer may have
        // replaced the entry in between, so re-check before removing.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Insert or overwrite a value.
    ///
    /// A `ttl` of `None` means the entry never expires.
    pub async fn set(&self, key: impl Into<String>, value: T, ttl: Option<Duration>) {
        let entry = CacheEntry { value, expires_at: ttl.map(|ttl| Instant::now() + ttl) };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Remove a single entry, expired or not.
    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, including not-yet-evicted expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
