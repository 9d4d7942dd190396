//! URL-keyed response cache.
//!
//! The memory cache bounds the total number of body bytes rather than the
//! entry count and expires entries lazily on read.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

/// An injectable byte cache keyed by request URL.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, url: &str) -> Option<Bytes>;

    async fn put(&self, url: &str, body: Bytes);

    async fn invalidate(&self, url: &str);
}

struct CachedResponse {
    body: Bytes,
    inserted_at: Instant,
}

/// Counters for the memory cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
    pub expired: AtomicU64,
    pub size_bytes: AtomicU64,
}

impl CacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes.load(Ordering::Relaxed)
    }
}

/// In-memory LRU response cache with a byte bound and a TTL.
pub struct MemoryResponseCache {
    // LruCache::get reorders, so reads need exclusive access.
    cache: Mutex<LruCache<String, CachedResponse>>,
    max_bytes: u64,
    ttl: Duration,
    stats: Arc<CacheStats>,
}

impl MemoryResponseCache {
    pub fn new(max_bytes: u64, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::unbounded()),
            max_bytes,
            ttl,
            stats: Arc::new(CacheStats::default()),
        }
    }

    /// Cache bounded to `max_entries` entries in addition to the byte bound.
    pub fn with_entry_limit(max_bytes: u64, ttl: Duration, max_entries: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(max_entries)),
            max_bytes,
            ttl,
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    fn forget(&self, entry: &CachedResponse) {
        self.stats
            .size_bytes
            .fetch_sub(entry.body.len() as u64, Ordering::Relaxed);
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, url: &str) -> Option<Bytes> {
        let mut cache = self.cache.lock().await;
        let expired = match cache.get(url) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.body.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            if let Some(entry) = cache.pop(url) {
                self.forget(&entry);
                self.stats.expired.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    async fn put(&self, url: &str, body: Bytes) {
        let size = body.len() as u64;
        if size > self.max_bytes {
            debug!(url, size, "Response larger than cache, not caching");
            return;
        }

        let mut cache = self.cache.lock().await;
        if let Some(previous) = cache.pop(url) {
            self.forget(&previous);
        }

        while self.stats.size_bytes() + size > self.max_bytes {
            match cache.pop_lru() {
                Some((_, evicted)) => {
                    self.forget(&evicted);
                    self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }

        let entry = CachedResponse {
            body,
            inserted_at: Instant::now(),
        };
        if let Some((_, displaced)) = cache.push(url.to_string(), entry) {
            // Entry limit reached.
            self.forget(&displaced);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.size_bytes.fetch_add(size, Ordering::Relaxed);
    }

    async fn invalidate(&self, url: &str) {
        if let Some(entry) = self.cache.lock().await.pop(url) {
            self.forget(&entry);
        }
    }
}
