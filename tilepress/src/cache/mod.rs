//! Cache services, eviction, contexts, and the cache registry.
//!
//! Caches are partitioned per (layer × category): every map layer gets its
//! own cache instance per kind of artifact (rendered tile, legend image,
//! full map image), so sizing and eviction policies can differ per
//! category and a whole layer's caches can be dropped when the layer
//! leaves the configuration.
//!
//! # Key Components
//!
//! - [`CacheService`] - the uniform key→value store contract; typed reads
//!   via [`CacheServiceExt::get_as`] degrade type mismatches to misses
//! - [`InMemoryCache`] - concurrent map store bounded by a FIFO ledger
//! - [`NoOpCache`] - caching disabled, same contract
//! - [`BoundedFifoLedger`] - the eviction bookkeeping shared by bounded
//!   stores
//! - [`CacheRegistry`] / [`CacheFactory`] - explicit (layer, category) →
//!   cache lookup; no process-global state
//! - [`CacheContext`] - the recorded set of named inputs behind a derived
//!   key, kept for collision diagnostics
//! - [`CacheContainer`] - the stored artifact plus invalidation metadata

mod container;
mod context;
mod error;
mod eviction;
mod factory;
mod key;
mod memory;
mod service;

pub use container::CacheContainer;
pub use context::{CacheContext, ContextValue, SECURITY_CONTEXT_KEY};
pub use error::CacheError;
pub use eviction::{BoundedFifoLedger, EvictionStore};
pub use factory::{CacheCategory, CacheFactory, CacheRegistry, InMemoryCacheFactory, NoOpCacheFactory};
pub use key::CacheKey;
pub use memory::{CacheStats, InMemoryCache};
pub use service::{CacheService, CacheServiceExt, CachedValue, NoOpCache};
