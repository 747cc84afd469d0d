//! Opaque security context consumed as a cache key ingredient.
//!
//! Authentication and session management live outside this crate; what
//! arrives here is only their *result*: an opaque description of who the
//! caller is and what they are allowed to see. Two requests that differ
//! only in authorization must never share a cached artifact, so the
//! context's digest participates in every derived cache key.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// The caller's authorization context, as produced by an external auth
/// collaborator.
///
/// The core never inspects the fields; it only needs equality (for
/// defensive cache-context comparison) and a stable [`digest`] to mix
/// into derived cache keys.
///
/// [`digest`]: SecurityContext::digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityContext {
    /// Principal identifier (user or service account name).
    principal: String,
    /// Opaque authorization scope token (filter set, role digest, ...).
    scope: String,
}

impl SecurityContext {
    /// Create a security context from a principal and an opaque scope
    /// token.
    pub fn new(principal: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            scope: scope.into(),
        }
    }

    /// The context of an unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::new("anonymous", "")
    }

    /// Principal identifier, for logging.
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Stable fingerprint of this context, mixed into derived cache keys.
    ///
    /// Stability is only required within one process: the caches this
    /// crate manages are in-process and do not outlive it.
    pub fn digest(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.principal.hash(&mut hasher);
        self.scope.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

impl Default for SecurityContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
