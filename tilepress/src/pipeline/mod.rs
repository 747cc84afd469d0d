//! Step pipeline definitions and the execution engine.
//!
//! A pipeline is a named, ordered sequence of steps executed against one
//! request/response pair. Each step returns a [`StepOutcome`] telling the
//! engine what to do next: continue, stop, skip forward, restart, or loop
//! back to an earlier step.
//!
//! # Architecture
//!
//! ```text
//! Request ──▶ [ step 1 ] ──▶ [ step 2 ] ──▶ ... ──▶ [ step n ] ──▶ Response
//!                 │ Continue / Stop / JumpTo / Restart / LoopTo
//!                 ▼
//!             ParamBag (run-local, shared across the run's steps)
//! ```
//!
//! Definitions are immutable configuration: built once at startup through
//! [`PipelineBuilder`] and shared read-only across unlimited concurrent
//! runs. Everything mutable (cursor, step counter, [`ParamBag`]) is owned
//! by a single run, so no locking is involved.
//!
//! Because `Restart` and `LoopTo` can form cycles, the engine counts step
//! executions and aborts with [`PipelineError::StepLimitExceeded`] once a
//! fixed safety ceiling is crossed.
//!
//! # Example
//!
//! ```ignore
//! use tilepress::pipeline::{FnStep, PipelineBuilder, PipelineEngine, StepOutcome};
//!
//! let pipeline = PipelineBuilder::new("render-legend")
//!     .step(FnStep::new("resolve-style", |req, params, res| {
//!         // ...
//!         Ok(StepOutcome::Continue)
//!     }))
//!     .step(FnStep::new("draw", |req, params, res| {
//!         // ...
//!         Ok(StepOutcome::Stop)
//!     }))
//!     .build()?;
//!
//! PipelineEngine::new().run(&pipeline, &request, &mut response)?;
//! ```

mod definition;
mod engine;
mod error;
mod params;
mod step;

pub use definition::{PipelineBuilder, PipelineDefinition};
pub use engine::{PipelineEngine, DEFAULT_STEP_LIMIT};
pub use error::PipelineError;
pub use params::ParamBag;
pub use step::{FnStep, PipelineStep, StepFailure, StepOutcome};
