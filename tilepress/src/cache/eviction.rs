//! Bounded round-robin (FIFO) eviction bookkeeping.
//!
//! The ledger holds one lightweight record per cached artifact, in
//! insertion order, and decides what to evict when a bounded cache is
//! full. It never holds the artifacts themselves; the store does, behind
//! the [`EvictionStore`] seam. Ledger and store mutate under one
//! per-instance lock so an artifact can never outlive its record or vice
//! versa.
//!
//! The lock is intentionally coarse: insertion is a low-frequency
//! administrative path compared to lookups, which bypass the ledger
//! entirely.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::cache::{CacheError, CacheKey, CachedValue};

/// The artifact store a [`BoundedFifoLedger`] keeps in sync with itself.
///
/// `store_delete` is fallible on purpose: when deleting the oldest
/// artifact fails, the ledger aborts the insertion instead of exceeding
/// capacity.
pub trait EvictionStore {
    /// Insert or replace the artifact under `key`.
    fn store_insert(&self, key: &CacheKey, value: CachedValue) -> Result<(), CacheError>;

    /// Delete the artifact under `key`. Deleting an absent key succeeds.
    fn store_delete(&self, key: &CacheKey) -> Result<(), CacheError>;
}

/// Lightweight metadata record for one cached artifact.
#[derive(Debug, Clone)]
struct LedgerRecord {
    key: CacheKey,
    /// Monotonic insertion sequence, for diagnostics.
    sequence: u64,
}

#[derive(Debug)]
struct LedgerState {
    capacity: usize,
    records: VecDeque<LedgerRecord>,
    members: HashSet<CacheKey>,
    next_sequence: u64,
}

/// FIFO eviction ledger bounding the number of artifacts in a store.
///
/// Capacity 0 means unbounded: artifacts are never evicted. A non-zero
/// capacity is fixed for the lifetime of a populated instance; changing
/// it is rejected once the ledger holds entries, so capacity assumptions
/// other code depends on cannot be silently invalidated.
#[derive(Debug)]
pub struct BoundedFifoLedger {
    state: Mutex<LedgerState>,
}

impl BoundedFifoLedger {
    /// Ledger bounding a store to `capacity` artifacts (0 = unbounded).
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                capacity,
                records: VecDeque::new(),
                members: HashSet::new(),
                next_sequence: 0,
            }),
        }
    }

    /// Ledger that never evicts.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// The configured capacity (0 = unbounded).
    pub fn capacity(&self) -> usize {
        self.state.lock().unwrap().capacity
    }

    /// Change the capacity.
    ///
    /// Fails with [`CacheError::CapacityLocked`] once the ledger is
    /// non-empty, leaving the capacity unchanged.
    pub fn set_capacity(&self, capacity: usize) -> Result<(), CacheError> {
        let mut state = self.state.lock().unwrap();
        if !state.records.is_empty() {
            return Err(CacheError::CapacityLocked {
                entries: state.records.len(),
            });
        }
        state.capacity = capacity;
        Ok(())
    }

    /// Insert an artifact into the store under this ledger's bookkeeping.
    ///
    /// At capacity, the oldest record's artifact is deleted from the
    /// store *before* the new one is inserted. If that deletion fails the
    /// insertion is aborted and the error reported; ledger and store keep
    /// their previous, consistent state.
    ///
    /// Re-inserting a key already in the ledger replaces the stored value
    /// without consuming capacity or changing the key's eviction order.
    ///
    /// # Returns
    ///
    /// The key that was evicted to make room, if any.
    pub fn add_to_cache(
        &self,
        store: &dyn EvictionStore,
        key: CacheKey,
        value: CachedValue,
    ) -> Result<Option<CacheKey>, CacheError> {
        let mut state = self.state.lock().unwrap();

        if state.members.contains(&key) {
            store.store_insert(&key, value)?;
            return Ok(None);
        }

        let mut evicted = None;
        if state.capacity > 0 && state.records.len() >= state.capacity {
            if let Some(oldest_key) = state.records.front().map(|record| record.key.clone()) {
                store.store_delete(&oldest_key)?;
                state.records.pop_front();
                state.members.remove(&oldest_key);
                evicted = Some(oldest_key);
            }
        }

        store.store_insert(&key, value)?;
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.members.insert(key.clone());
        state.records.push_back(LedgerRecord { key, sequence });
        Ok(evicted)
    }

    /// Membership test by key, answered purely from the ledger without a
    /// storage round trip.
    pub fn is_in_cache(&self, key: &CacheKey) -> bool {
        self.state.lock().unwrap().members.contains(key)
    }

    /// Remove one artifact from store and ledger together.
    pub fn remove(&self, store: &dyn EvictionStore, key: &CacheKey) -> Result<(), CacheError> {
        let mut state = self.state.lock().unwrap();
        if !state.members.contains(key) {
            return Ok(());
        }
        store.store_delete(key)?;
        state.members.remove(key);
        state.records.retain(|record| record.key != *key);
        Ok(())
    }

    /// Remove every artifact from store and ledger together.
    ///
    /// Stops at the first failed deletion, leaving the remaining entries
    /// consistent.
    pub fn clear(&self, store: &dyn EvictionStore) -> Result<(), CacheError> {
        let mut state = self.state.lock().unwrap();
        while let Some(key) = state.records.front().map(|record| record.key.clone()) {
            store.store_delete(&key)?;
            state.records.pop_front();
            state.members.remove(&key);
        }
        Ok(())
    }

    /// Number of tracked artifacts.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    /// Whether the ledger tracks no artifacts.
    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().records.is_empty()
    }

    /// Insertion sequence of the oldest tracked artifact, for
    /// diagnostics.
    pub fn oldest_sequence(&self) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .records
            .front()
            .map(|record| record.sequence)
    }
}
