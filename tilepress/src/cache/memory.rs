//! In-memory cache bounded by the FIFO eviction ledger.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::cache::{
    BoundedFifoLedger, CacheError, CacheKey, CacheService, CachedValue, EvictionStore,
};

/// Counters for cache monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Concurrent map store behind the [`EvictionStore`] seam.
#[derive(Default)]
struct MapStore {
    entries: DashMap<CacheKey, CachedValue>,
}

impl EvictionStore for MapStore {
    fn store_insert(&self, key: &CacheKey, value: CachedValue) -> Result<(), CacheError> {
        self.entries.insert(key.clone(), value);
        Ok(())
    }

    fn store_delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// In-process cache for one (layer, category) partition.
///
/// Reads are lock-free against the backing map; insertions and removals
/// serialize through the eviction ledger's lock so the ledger and the
/// store can never diverge.
pub struct InMemoryCache {
    store: MapStore,
    ledger: BoundedFifoLedger,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryCache {
    /// Cache holding at most `capacity` artifacts (0 = unbounded).
    pub fn new(capacity: usize) -> Self {
        Self {
            store: MapStore::default(),
            ledger: BoundedFifoLedger::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Cache that never evicts.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Configured capacity (0 = unbounded).
    pub fn capacity(&self) -> usize {
        self.ledger.capacity()
    }

    /// Membership test without touching the backing store.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.ledger.is_in_cache(key)
    }

    /// Number of cached artifacts.
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    /// Snapshot of hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.ledger.len(),
        }
    }
}

impl CacheService for InMemoryCache {
    fn put(&self, key: CacheKey, value: CachedValue) -> Result<(), CacheError> {
        match self.ledger.add_to_cache(&self.store, key, value) {
            Ok(Some(evicted)) => {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %evicted, "evicted oldest cache entry to make room");
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                warn!(error = %err, "cache insertion aborted; serving uncached");
                Err(err)
            }
        }
    }

    fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        match self.store.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(CachedValue::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn remove(&self, key: &CacheKey) {
        // MapStore deletion is infallible; the Result is for stores that
        // can actually refuse.
        if let Err(err) = self.ledger.remove(&self.store, key) {
            warn!(key = %key, error = %err, "failed to remove cache entry");
        }
    }

    fn clear(&self) {
        if let Err(err) = self.ledger.clear(&self.store) {
            warn!(error = %err, "failed to clear cache");
        }
    }

    fn dispose(&self) {
        self.clear();
        debug!("cache disposed");
    }
}
