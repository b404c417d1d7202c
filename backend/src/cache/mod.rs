//! Table cache - reuse raw tables across requests
//!
//! Player and match tables take a long time to scrape, and the same season is
//! usually requested several times in a row (preview, then download). Raw
//! tables are kept in an LRU bounded by entry count, each entry expiring after
//! a fixed TTL. The cache is a plain value owned by the pipeline.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::{Category, Query, RawTable};

/// Default number of cached tables.
pub const DEFAULT_CAPACITY: usize = 64;

/// Default time a table stays valid.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Everything that determines what the source returns.
///
/// Team filters are applied after retrieval, so they are not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub category: Category,
    pub leagues: Vec<String>,
    pub seasons: Vec<String>,
    pub stat_type: Option<&'static str>,
}

impl CacheKey {
    pub fn new(query: &Query) -> Self {
        Self {
            category: query.category,
            leagues: query.leagues.iter().map(|l| l.native_id().to_string()).collect(),
            seasons: query.seasons.clone(),
            stat_type: query.stat_type,
        }
    }
}

#[derive(Debug)]
struct CachedTable {
    table: Arc<RawTable>,
    cached_at: Instant,
}

impl CachedTable {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() >= ttl
    }
}

/// Shared TTL + LRU cache of raw tables.
///
/// Cloning yields a handle to the same cache.
#[derive(Debug, Clone)]
pub struct TableCache {
    entries: Arc<Mutex<LruCache<CacheKey, CachedTable>>>,
    ttl: Duration,
}

impl TableCache {
    /// Create a cache holding at most `capacity` tables (minimum one).
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a live entry, dropping it if it has expired.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<RawTable>> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                debug!(category = %key.category, age = ?entry.cached_at.elapsed(), "Cache hit");
                return Some(entry.table.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!(category = %key.category, "Dropping expired cache entry");
            entries.pop(key);
        }
        None
    }

    pub async fn insert(&self, key: CacheKey, table: Arc<RawTable>) {
        debug!(category = %key.category, rows = table.rows.len(), "Caching table");
        self.entries.lock().await.put(
            key,
            CachedTable {
                table,
                cached_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for TableCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
