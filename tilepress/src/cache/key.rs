//! Opaque cache key type.

use std::fmt;

/// Key uniquely identifying one cached artifact within one cache
/// category.
///
/// Keys are opaque strings built deterministically from an ordered list of
/// named context values plus the caller's security digest (see
/// [`CachingSupport::derive_key`](crate::render::CachingSupport::derive_key)).
/// Equal keys are expected to denote identical logical inputs; the
/// recorded [`CacheContext`](crate::cache::CacheContext) exists to verify
/// that expectation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already derived key string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}
