//! Caching-support glue between pipelines and the cache subsystem.
//!
//! Pipelines stay cache-unaware: a lookup step asks [`CachingSupport`]
//! for the container belonging to the current request, and a later render
//! step stores its freshly computed result the same way. Key derivation,
//! context recording, and the invalidation index all live here.
//!
//! # Flow
//!
//! ```text
//! ParamBag (seeded with context values)
//!    │
//!    ├─ derive_key ── reuse key stashed by an earlier step, or
//!    │                concatenate declared context values + security digest
//!    │
//!    ├─ get_container ── hit: verify recorded context, return container
//!    │                   miss: None; a later step computes the artifact
//!    │
//!    └─ put_container ── wrap result + envelope + context, store, and
//!                        record the envelope for spatial invalidation
//! ```

mod support;

pub use support::{CacheSpec, CachingSupport};
