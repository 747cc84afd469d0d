//! Cache categories, factories, and the explicit registry.
//!
//! The registry replaces ambient global state: collaborators hold a
//! reference to one `CacheRegistry` and ask it for the cache of a
//! (layer, category) pair. Instances are created lazily through the
//! configured [`CacheFactory`]; backend selection (bounded in-process,
//! no-op, something external) is configuration, not core logic.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::cache::{CacheService, InMemoryCache, NoOpCache};

/// Partition of cache instances by kind of artifact.
///
/// Eviction and sizing policies differ per category: rendered tiles are
/// many and small, legend images few and reusable, full map images large
/// and rarely identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheCategory(Cow<'static, str>);

impl CacheCategory {
    /// Rendered map tiles.
    pub const TILE: CacheCategory = CacheCategory(Cow::Borrowed("tile"));
    /// Legend images.
    pub const LEGEND: CacheCategory = CacheCategory(Cow::Borrowed("legend"));
    /// Full map images (non-tiled rendering).
    pub const IMAGE: CacheCategory = CacheCategory(Cow::Borrowed("image"));

    /// A category outside the predefined set.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The category name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creates cache instances for (layer, category) pairs.
pub trait CacheFactory: Send + Sync {
    /// Create a fresh cache for the given layer and category.
    fn create(&self, layer: &str, category: &CacheCategory) -> Arc<dyn CacheService>;
}

/// Factory producing bounded [`InMemoryCache`] instances.
///
/// Capacities are per category, with a default for categories not
/// explicitly configured.
pub struct InMemoryCacheFactory {
    default_capacity: usize,
    capacities: HashMap<CacheCategory, usize>,
}

impl InMemoryCacheFactory {
    /// Factory whose caches hold at most `default_capacity` artifacts
    /// each (0 = unbounded).
    pub fn new(default_capacity: usize) -> Self {
        Self {
            default_capacity,
            capacities: HashMap::new(),
        }
    }

    /// Override the capacity for one category.
    pub fn with_capacity(mut self, category: CacheCategory, capacity: usize) -> Self {
        self.capacities.insert(category, capacity);
        self
    }

    /// The capacity a cache of the given category would be created with.
    pub fn capacity_for(&self, category: &CacheCategory) -> usize {
        self.capacities
            .get(category)
            .copied()
            .unwrap_or(self.default_capacity)
    }
}

impl CacheFactory for InMemoryCacheFactory {
    fn create(&self, layer: &str, category: &CacheCategory) -> Arc<dyn CacheService> {
        let capacity = self.capacity_for(category);
        info!(layer, category = %category, capacity, "creating in-memory cache");
        Arc::new(InMemoryCache::new(capacity))
    }
}

/// Factory producing [`NoOpCache`] instances: caching disabled.
#[derive(Debug, Clone, Default)]
pub struct NoOpCacheFactory;

impl CacheFactory for NoOpCacheFactory {
    fn create(&self, _layer: &str, _category: &CacheCategory) -> Arc<dyn CacheService> {
        Arc::new(NoOpCache::new())
    }
}

/// Explicit (layer × category) → cache map.
///
/// Creation is lazy and idempotent: the first request for a pair creates
/// the instance through the factory; later requests return the same
/// instance.
pub struct CacheRegistry {
    factory: Arc<dyn CacheFactory>,
    caches: DashMap<(String, CacheCategory), Arc<dyn CacheService>>,
}

impl CacheRegistry {
    /// Registry backed by the given factory.
    pub fn new(factory: Arc<dyn CacheFactory>) -> Self {
        Self {
            factory,
            caches: DashMap::new(),
        }
    }

    /// The cache for a (layer, category) pair, created on first use.
    pub fn cache(&self, layer: &str, category: &CacheCategory) -> Arc<dyn CacheService> {
        let entry = self
            .caches
            .entry((layer.to_string(), category.clone()))
            .or_insert_with(|| self.factory.create(layer, category));
        Arc::clone(entry.value())
    }

    /// Dispose and forget every cache of one layer, e.g. when the layer
    /// is removed from configuration.
    pub fn drop_layer(&self, layer: &str) -> usize {
        let mut dropped = 0;
        self.caches.retain(|(cache_layer, _), cache| {
            if cache_layer == layer {
                cache.dispose();
                dropped += 1;
                false
            } else {
                true
            }
        });
        if dropped > 0 {
            info!(layer, caches = dropped, "dropped layer caches");
        }
        dropped
    }

    /// Dispose and forget one (layer, category) cache.
    pub fn drop_cache(&self, layer: &str, category: &CacheCategory) -> bool {
        if let Some((_, cache)) = self
            .caches
            .remove(&(layer.to_string(), category.clone()))
        {
            cache.dispose();
            true
        } else {
            false
        }
    }

    /// Number of live cache instances.
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Whether no cache instances exist yet.
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, CacheServiceExt};

    fn registry(default_capacity: usize) -> CacheRegistry {
        CacheRegistry::new(Arc::new(InMemoryCacheFactory::new(default_capacity)))
    }

    #[test]
    fn test_category_names() {
        assert_eq!(CacheCategory::TILE.name(), "tile");
        assert_eq!(CacheCategory::LEGEND.name(), "legend");
        assert_eq!(CacheCategory::new("elevation").name(), "elevation");
        assert_eq!(CacheCategory::new("tile"), CacheCategory::TILE);
    }

    #[test]
    fn test_registry_returns_same_instance_per_pair() {
        let registry = registry(16);
        let first = registry.cache("roads", &CacheCategory::TILE);
        let second = registry.cache("roads", &CacheCategory::TILE);

        first
            .put_value(CacheKey::from("k"), 42u32)
            .unwrap();
        assert!(
            second.get_as::<u32>(&CacheKey::from("k")).is_some(),
            "both handles must address the same cache"
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_partitions_by_layer_and_category() {
        let registry = registry(16);
        let tiles = registry.cache("roads", &CacheCategory::TILE);
        let legends = registry.cache("roads", &CacheCategory::LEGEND);
        let other_layer = registry.cache("rivers", &CacheCategory::TILE);

        tiles.put_value(CacheKey::from("k"), 1u32).unwrap();
        assert!(legends.get(&CacheKey::from("k")).is_none());
        assert!(other_layer.get(&CacheKey::from("k")).is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_drop_layer_disposes_all_its_caches() {
        let registry = registry(16);
        registry.cache("roads", &CacheCategory::TILE);
        registry.cache("roads", &CacheCategory::LEGEND);
        registry.cache("rivers", &CacheCategory::TILE);

        assert_eq!(registry.drop_layer("roads"), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.drop_layer("roads"), 0);
    }

    #[test]
    fn test_drop_single_cache() {
        let registry = registry(16);
        registry.cache("roads", &CacheCategory::TILE);

        assert!(registry.drop_cache("roads", &CacheCategory::TILE));
        assert!(!registry.drop_cache("roads", &CacheCategory::TILE));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_factory_per_category_capacity() {
        let factory = InMemoryCacheFactory::new(100).with_capacity(CacheCategory::LEGEND, 5);
        assert_eq!(factory.capacity_for(&CacheCategory::TILE), 100);
        assert_eq!(factory.capacity_for(&CacheCategory::LEGEND), 5);
    }

    #[test]
    fn test_noop_factory_disables_caching() {
        let registry = CacheRegistry::new(Arc::new(NoOpCacheFactory));
        let cache = registry.cache("roads", &CacheCategory::TILE);

        cache.put_value(CacheKey::from("k"), 1u32).unwrap();
        assert!(cache.get(&CacheKey::from("k")).is_none());
    }
}
