//! Cache-related errors.

use thiserror::Error;

/// Errors from cache operations and key derivation.
///
/// Note what is deliberately *not* here: a typed `get` whose stored value
/// has the wrong type is a miss, never an error, and a cache-context
/// mismatch is a logged warning, never an error.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Deleting the oldest entry during bounded insertion failed. The new
    /// artifact was not cached; the cache keeps its previous, consistent
    /// state.
    #[error("failed to evict '{key}' from the backing store: {reason}")]
    EvictionFailed { key: String, reason: String },

    /// The eviction capacity cannot change once the ledger holds entries.
    #[error("eviction capacity is locked while the ledger holds {entries} entries")]
    CapacityLocked { entries: usize },

    /// Key derivation found no context value under a declared name.
    /// Configuration error: the pipeline's declared context keys and the
    /// values seeded into the run disagree.
    #[error("no context value named '{key}' is available for key derivation")]
    MissingContextValue { key: String },

    /// The backing store rejected an operation.
    #[error("cache backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::CapacityLocked { entries: 3 };
        assert_eq!(
            format!("{}", err),
            "eviction capacity is locked while the ledger holds 3 entries"
        );

        let err = CacheError::MissingContextValue {
            key: "locale".to_string(),
        };
        assert!(format!("{}", err).contains("locale"));
    }
}
