//! Error types for pipeline construction and execution.
//!
//! The variants map onto three distinct failure classes so callers can
//! log them distinctly: configuration errors (bad jump/loop targets,
//! duplicate ids), step failures (domain errors propagated unchanged),
//! and the step-limit abort that usually indicates a misconfigured loop
//! rather than bad input.

use thiserror::Error;

/// Errors raised while building or running a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Two steps in one definition share an id. Detected at build time.
    #[error("pipeline '{pipeline}' declares duplicate step id '{id}'")]
    DuplicateStepId { pipeline: String, id: String },

    /// A `JumpTo` target does not exist strictly after the current step.
    /// Programmer error, fatal to the run, never retried.
    #[error("step '{step}' requested jump to '{target}', which is not a later step")]
    JumpTargetNotFound { step: String, target: String },

    /// A `LoopTo` target does not exist at or before the current step.
    /// Programmer error, fatal to the run, never retried.
    #[error("step '{step}' requested loop to '{target}', which is not an earlier step")]
    LoopTargetNotFound { step: String, target: String },

    /// The run executed more steps than the engine's safety ceiling
    /// allows. Usually a misconfigured `LoopTo`/`Restart` cycle.
    #[error("pipeline '{pipeline}' exceeded the step limit of {limit}")]
    StepLimitExceeded { pipeline: String, limit: usize },

    /// A step reported a domain-level failure. The run aborted at that
    /// step; the partially mutated response stays with the caller for
    /// diagnostics.
    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PipelineError {
    /// True for the variants that indicate a pipeline configuration bug
    /// rather than a runtime condition.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PipelineError::DuplicateStepId { .. }
                | PipelineError::JumpTargetNotFound { .. }
                | PipelineError::LoopTargetNotFound { .. }
        )
    }
}
