//! TilePress - Map rendering pipelines with content-addressed caching
//!
//! This library provides the core machinery for producing map output
//! (tiles, legends, full images) by running named step pipelines over a
//! request/response pair, and for memoizing the expensive results of those
//! pipelines behind per-layer, per-category caches.
//!
//! # High-Level API
//!
//! ```ignore
//! use tilepress::cache::{CacheRegistry, InMemoryCacheFactory};
//! use tilepress::pipeline::{PipelineBuilder, PipelineEngine};
//! use tilepress::render::{CacheSpec, CachingSupport};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(CacheRegistry::new(Arc::new(
//!     InMemoryCacheFactory::new(512),
//! )));
//! let caching = CachingSupport::new(Arc::clone(&registry));
//!
//! let pipeline = PipelineBuilder::new("render-tile")
//!     .step(resolve_step)
//!     .step(cache_lookup_step)
//!     .step(render_step)
//!     .build()?;
//!
//! let engine = PipelineEngine::new();
//! engine.run(&pipeline, &request, &mut response)?;
//! ```
//!
//! # Modules
//!
//! - [`pipeline`] - Step pipeline definitions and the execution engine
//! - [`cache`] - Cache services, eviction, contexts, and the registry
//! - [`render`] - Caching-support glue bridging pipelines to the cache
//! - [`tile`] - Tile codes, spiral ordering, and viewport fetch planning
//! - [`geom`] - The axis-aligned envelope carried as invalidation metadata
//! - [`security`] - The opaque authorization context consumed as a cache
//!   key ingredient

pub mod cache;
pub mod geom;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod security;
pub mod tile;

/// Version of the TilePress library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
