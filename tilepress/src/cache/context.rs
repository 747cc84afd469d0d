//! Cache context: the recorded inputs behind a derived key.
//!
//! A `CacheContext` travels with a cached artifact purely for defense and
//! diagnostics: two requests that derive the same key must, if both
//! contexts are built, produce structurally equal contexts. A mismatch
//! means key derivation is missing an input that affects output — a bug
//! to surface, not an error to fail the request over.

use std::collections::HashMap;
use std::fmt;

/// Reserved context key under which the caller's security digest is
/// always recorded.
pub const SECURITY_CONTEXT_KEY: &str = "$security-context";

/// One named cache-key ingredient in its typed, structurally comparable
/// form.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Bytes(Vec<u8>),
}

impl ContextValue {
    /// Stable string form used for key derivation.
    ///
    /// Must be injective per variant: two unequal values of one variant
    /// never share a canonical form.
    pub fn canonical(&self) -> String {
        match self {
            ContextValue::Text(text) => text.clone(),
            ContextValue::Integer(value) => value.to_string(),
            ContextValue::Boolean(value) => value.to_string(),
            ContextValue::Bytes(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for byte in bytes {
                    out.push_str(&format!("{:02x}", byte));
                }
                out
            }
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Integer(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Boolean(value)
    }
}

impl From<Vec<u8>> for ContextValue {
    fn from(value: Vec<u8>) -> Self {
        ContextValue::Bytes(value)
    }
}

/// The full set of named values a cache key was derived from, including
/// the security digest under [`SECURITY_CONTEXT_KEY`].
///
/// Not required for the lookup path; exists so equal keys can be
/// defensively verified to originate from equal inputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheContext {
    values: HashMap<String, ContextValue>,
}

impl CacheContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a named value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a named value.
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// The recorded security digest, if present.
    pub fn security_digest(&self) -> Option<&ContextValue> {
        self.values.get(SECURITY_CONTEXT_KEY)
    }

    /// Number of recorded values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Recorded keys, sorted, for diagnostics.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
