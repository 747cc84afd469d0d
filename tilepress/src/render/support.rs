//! Key derivation and container storage for cache-unaware pipelines.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::cache::{
    CacheCategory, CacheContainer, CacheContext, CacheError, CacheKey, CacheRegistry,
    CacheServiceExt, CachedValue, ContextValue, SECURITY_CONTEXT_KEY,
};
use crate::geom::Envelope;
use crate::pipeline::ParamBag;
use crate::security::SecurityContext;

/// Callback letting a caller add diagnostic entries to a freshly built
/// [`CacheContext`] before it is recorded or compared.
pub type ContextContributor<'a> = &'a dyn Fn(&ParamBag, &mut CacheContext);

/// Per-pipeline declaration of how cache keys are derived.
///
/// `context_keys` names, in a fixed declared order, the parameter-bag
/// values that affect this pipeline's output (layer id, normalized
/// bounding box, style identifier, locale, ...). The slots name where in
/// the bag the derived key and built context are stashed so later steps
/// of the same run reuse them instead of re-deriving.
#[derive(Debug, Clone)]
pub struct CacheSpec {
    category: CacheCategory,
    context_keys: Vec<String>,
    key_slot: String,
    context_slot: String,
}

impl CacheSpec {
    /// Spec for a category and its ordered context keys, with slot names
    /// derived from the category so two categories used in one pipeline
    /// never collide.
    pub fn new<I, S>(category: CacheCategory, context_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key_slot = format!("$cache-key:{}", category);
        let context_slot = format!("$cache-context:{}", category);
        Self {
            category,
            context_keys: context_keys.into_iter().map(Into::into).collect(),
            key_slot,
            context_slot,
        }
    }

    /// Override the parameter-bag slot holding the derived key.
    pub fn with_key_slot(mut self, slot: impl Into<String>) -> Self {
        self.key_slot = slot.into();
        self
    }

    /// Override the parameter-bag slot holding the built context.
    pub fn with_context_slot(mut self, slot: impl Into<String>) -> Self {
        self.context_slot = slot.into();
        self
    }

    /// The cache category this spec addresses.
    pub fn category(&self) -> &CacheCategory {
        &self.category
    }

    /// The declared context key names, in derivation order.
    pub fn context_keys(&self) -> &[String] {
        &self.context_keys
    }

    /// The parameter-bag slot for the derived key.
    pub fn key_slot(&self) -> &str {
        &self.key_slot
    }
}

/// Bridges cache-unaware pipeline invocations to the cache subsystem.
///
/// Context verification is a diagnostic aid, not a correctness
/// mechanism: with `verify_context` enabled (the default), every hit
/// rebuilds the context and compares it with the one recorded at store
/// time. A mismatch means key derivation misses an input that affects
/// output; it is logged and counted, never fatal to the request.
/// Production deployments on a hot path may disable it.
pub struct CachingSupport {
    registry: Arc<CacheRegistry>,
    verify_context: bool,
    context_mismatches: AtomicU64,
    /// (layer, category) → recorded (key, envelope) pairs, so spatial
    /// invalidation never has to enumerate cache keys.
    envelopes: DashMap<(String, CacheCategory), Vec<(CacheKey, Envelope)>>,
}

impl CachingSupport {
    /// Glue over the given registry, with context verification enabled.
    pub fn new(registry: Arc<CacheRegistry>) -> Self {
        Self {
            registry,
            verify_context: true,
            context_mismatches: AtomicU64::new(0),
            envelopes: DashMap::new(),
        }
    }

    /// Enable or disable hit-time context verification.
    pub fn with_verification(mut self, verify_context: bool) -> Self {
        self.verify_context = verify_context;
        self
    }

    /// The registry this glue stores through.
    pub fn registry(&self) -> &Arc<CacheRegistry> {
        &self.registry
    }

    /// Number of context mismatches observed on hits so far. A non-zero
    /// value indicates a key-derivation defect; tests assert on it.
    pub fn context_mismatches(&self) -> u64 {
        self.context_mismatches.load(Ordering::Relaxed)
    }

    /// Derive the cache key for the current run, or reuse the one a
    /// previous step stashed under the spec's key slot.
    ///
    /// The key concatenates, in declared order, the canonical forms of
    /// the context values named by the spec, then the security digest.
    /// A declared name with no value in the bag is a configuration error.
    pub fn derive_key(
        &self,
        params: &mut ParamBag,
        spec: &CacheSpec,
        security: &SecurityContext,
    ) -> Result<CacheKey, CacheError> {
        if let Some(key) = params.get::<CacheKey>(&spec.key_slot) {
            return Ok(key.clone());
        }

        let mut raw = String::new();
        for name in &spec.context_keys {
            let value = params.get::<ContextValue>(name).ok_or_else(|| {
                CacheError::MissingContextValue { key: name.clone() }
            })?;
            raw.push_str(&value.canonical());
            raw.push('|');
        }
        raw.push_str(&security.digest());

        let key = CacheKey::new(raw);
        debug!(key = %key, category = %spec.category, "derived cache key");
        params.insert(spec.key_slot.clone(), key.clone());
        Ok(key)
    }

    /// Build the full context: declared values, security digest, and any
    /// contributor additions.
    fn build_context(
        &self,
        params: &ParamBag,
        spec: &CacheSpec,
        security: &SecurityContext,
        contributor: Option<ContextContributor<'_>>,
    ) -> Result<CacheContext, CacheError> {
        let mut context = CacheContext::new();
        for name in &spec.context_keys {
            let value = params.get::<ContextValue>(name).ok_or_else(|| {
                CacheError::MissingContextValue { key: name.clone() }
            })?;
            context.set(name.clone(), value.clone());
        }
        context.set(SECURITY_CONTEXT_KEY, security.digest());
        if let Some(contribute) = contributor {
            contribute(params, &mut context);
        }
        Ok(context)
    }

    /// Look up the container for the current request.
    ///
    /// Returns `None` on a miss and on a stored container of a different
    /// result type (stale entries degrade to recomputation). The caller
    /// is responsible for computing the artifact and calling
    /// [`put_container`](Self::put_container) afterwards.
    pub fn get_container<T: Any + Send + Sync>(
        &self,
        params: &mut ParamBag,
        spec: &CacheSpec,
        layer: &str,
        security: &SecurityContext,
        contributor: Option<ContextContributor<'_>>,
    ) -> Result<Option<Arc<CacheContainer<T>>>, CacheError> {
        let key = self.derive_key(params, spec, security)?;
        let cache = self.registry.cache(layer, &spec.category);

        let Some(container) = cache.get_as::<CacheContainer<T>>(&key) else {
            return Ok(None);
        };

        if self.verify_context {
            let fresh = self.build_context(params, spec, security, contributor)?;
            if fresh != *container.context() {
                self.context_mismatches.fetch_add(1, Ordering::Relaxed);
                warn!(
                    key = %key,
                    layer,
                    category = %spec.category,
                    "cache context mismatch for equal keys; key derivation is missing an input"
                );
            }
            params.insert(spec.context_slot.clone(), fresh);
        }

        Ok(Some(container))
    }

    /// Store a freshly computed result for the current request.
    ///
    /// Derives or reuses the key, builds the full context, wraps
    /// everything into a [`CacheContainer`], stores it in the category's
    /// cache, and records the invalidation envelope. An eviction failure
    /// is reported but the caller still holds its result: the request is
    /// slower, not wrong.
    pub fn put_container<T: Any + Send + Sync>(
        &self,
        params: &mut ParamBag,
        spec: &CacheSpec,
        layer: &str,
        security: &SecurityContext,
        contributor: Option<ContextContributor<'_>>,
        result: T,
        envelope: Envelope,
    ) -> Result<Arc<CacheContainer<T>>, CacheError> {
        let key = self.derive_key(params, spec, security)?;
        let context = match params.get::<CacheContext>(&spec.context_slot) {
            Some(context) => context.clone(),
            None => {
                let context = self.build_context(params, spec, security, contributor)?;
                params.insert(spec.context_slot.clone(), context.clone());
                context
            }
        };

        let container = Arc::new(CacheContainer::new(result, envelope, context));
        let cache = self.registry.cache(layer, &spec.category);
        cache.put(key.clone(), Arc::clone(&container) as CachedValue)?;

        let mut entries = self
            .envelopes
            .entry((layer.to_string(), spec.category.clone()))
            .or_default();
        if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = envelope;
        } else {
            entries.push((key, envelope));
        }

        Ok(container)
    }

    /// Drop every recorded entry of a (layer, category) cache whose
    /// envelope intersects the given one, e.g. after a data edit.
    ///
    /// # Returns
    ///
    /// The number of entries dropped.
    pub fn drop_overlapping(
        &self,
        layer: &str,
        category: &CacheCategory,
        envelope: &Envelope,
    ) -> usize {
        let cache = self.registry.cache(layer, category);
        let mut dropped = 0;

        if let Some(mut entries) = self
            .envelopes
            .get_mut(&(layer.to_string(), category.clone()))
        {
            entries.retain(|(key, recorded)| {
                if recorded.intersects(envelope) {
                    cache.remove(key);
                    dropped += 1;
                    false
                } else {
                    true
                }
            });
        }

        if dropped > 0 {
            debug!(layer, category = %category, dropped, "dropped overlapping cache entries");
        }
        dropped
    }
}
