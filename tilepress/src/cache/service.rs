//! Cache service contract and the no-op backend.

use std::any::Any;
use std::sync::Arc;

use crate::cache::{CacheError, CacheKey};

/// Value as stored in a cache: shared, type-erased, thread-safe.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Uniform key→value store for one (layer, category) cache instance.
///
/// Backends are pluggable: a bounded in-process map, a no-op (caching
/// disabled), or anything an embedder provides. Reads are expected to be
/// cheap and concurrent; mutations may serialize internally.
pub trait CacheService: Send + Sync {
    /// Store a value under a key, replacing any previous value.
    ///
    /// Fails only when bounded eviction cannot make room (the artifact is
    /// then simply not cached; the caller still holds its result).
    fn put(&self, key: CacheKey, value: CachedValue) -> Result<(), CacheError>;

    /// Retrieve the value under a key, if present.
    fn get(&self, key: &CacheKey) -> Option<CachedValue>;

    /// Remove the value under a key, if present.
    fn remove(&self, key: &CacheKey);

    /// Remove every entry from this cache.
    fn clear(&self);

    /// Release the cache's resources entirely, e.g. when its layer is
    /// removed from configuration. The instance stays safe to call but
    /// behaves as empty afterwards.
    fn dispose(&self);
}

/// Typed access on top of any [`CacheService`].
pub trait CacheServiceExt: CacheService {
    /// Retrieve the value under a key as a `T`.
    ///
    /// Returns `None` both on a missing key and on a stored value of a
    /// different type. The silent type mismatch is deliberate: stale or
    /// incompatible entries left over from an earlier deployment degrade
    /// to a cache miss and get recomputed, instead of failing the
    /// request. Do not turn this into an error.
    fn get_as<T: Any + Send + Sync>(&self, key: &CacheKey) -> Option<Arc<T>> {
        self.get(key).and_then(|value| value.downcast::<T>().ok())
    }

    /// Store a concrete value under a key.
    fn put_value<T: Any + Send + Sync>(&self, key: CacheKey, value: T) -> Result<(), CacheError> {
        self.put(key, Arc::new(value))
    }
}

impl<C: CacheService + ?Sized> CacheServiceExt for C {}

/// Cache backend that never stores anything.
///
/// Satisfies the full contract with caching disabled: `get` always
/// returns `None`, mutations succeed and do nothing. Useful for
/// benchmarking render paths and for layers configured without caching.
#[derive(Debug, Clone, Default)]
pub struct NoOpCache;

impl NoOpCache {
    pub fn new() -> Self {
        Self
    }
}

impl CacheService for NoOpCache {
    fn put(&self, _key: CacheKey, _value: CachedValue) -> Result<(), CacheError> {
        Ok(())
    }

    fn get(&self, _key: &CacheKey) -> Option<CachedValue> {
        None
    }

    fn remove(&self, _key: &CacheKey) {}

    fn clear(&self) {}

    fn dispose(&self) {}
}
