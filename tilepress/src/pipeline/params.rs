//! Run-local heterogeneous parameter bag.
//!
//! The bag is the only channel for cross-step state: created fresh per
//! pipeline run, owned exclusively by that run, and dropped with it. The
//! caching-support glue also uses it to stash a derived cache key so later
//! steps in the same run can reuse it, and long-running steps look here
//! for cancellation flags passed in by the caller.

use std::any::Any;
use std::collections::HashMap;

/// String-keyed map of arbitrarily typed values, scoped to one pipeline
/// run.
///
/// Lookups are typed: asking for the wrong type behaves like a missing
/// key.
#[derive(Default)]
pub struct ParamBag {
    values: HashMap<String, Box<dyn Any + Send>>,
}

impl ParamBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, replacing any previous value regardless
    /// of its type.
    pub fn insert<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Borrow the value under `key` if it exists and has type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Mutably borrow the value under `key` if it exists and has type `T`.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Remove and return the value under `key` if it has type `T`.
    ///
    /// A type mismatch leaves the stored value in place.
    pub fn take<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.values.get(key)?.is::<T>() {
            return None;
        }
        self.values
            .remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Remove the value under `key`, whatever its type.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Whether any value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for ParamBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("ParamBag").field("keys", &keys).finish()
    }
}
