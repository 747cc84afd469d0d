//! Immutable pipeline definitions and their builder.

use std::collections::HashSet;
use std::sync::Arc;

use crate::pipeline::{PipelineError, PipelineStep};

/// A named, ordered sequence of steps.
///
/// Definitions are configuration: created at startup, never mutated, and
/// shared read-only across unlimited concurrent runs. All run-local state
/// lives in the engine's stack and the run's
/// [`ParamBag`](crate::pipeline::ParamBag).
pub struct PipelineDefinition<Req, Res> {
    name: String,
    steps: Vec<Arc<dyn PipelineStep<Req, Res>>>,
}

impl<Req, Res> PipelineDefinition<Req, Res> {
    /// Name of this pipeline, for logging and error reporting.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The steps in declared order.
    pub fn steps(&self) -> &[Arc<dyn PipelineStep<Req, Res>>] {
        &self.steps
    }

    /// Number of declared steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline declares no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Position of the step with the given id, if declared.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id() == id)
    }
}

impl<Req, Res> std::fmt::Debug for PipelineDefinition<Req, Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.steps.iter().map(|s| s.id()).collect();
        f.debug_struct("PipelineDefinition")
            .field("name", &self.name)
            .field("steps", &ids)
            .finish()
    }
}

/// Builder for [`PipelineDefinition`].
///
/// Rejects duplicate step ids at build time so jump/loop targets stay
/// unambiguous.
pub struct PipelineBuilder<Req, Res> {
    name: String,
    steps: Vec<Arc<dyn PipelineStep<Req, Res>>>,
}

impl<Req, Res> PipelineBuilder<Req, Res> {
    /// Start a builder for a pipeline with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn step(mut self, step: impl PipelineStep<Req, Res> + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Append an already shared step.
    pub fn shared_step(mut self, step: Arc<dyn PipelineStep<Req, Res>>) -> Self {
        self.steps.push(step);
        self
    }

    /// Finish the definition, verifying step id uniqueness.
    pub fn build(self) -> Result<PipelineDefinition<Req, Res>, PipelineError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id().to_string()) {
                return Err(PipelineError::DuplicateStepId {
                    pipeline: self.name,
                    id: step.id().to_string(),
                });
            }
        }
        Ok(PipelineDefinition {
            name: self.name,
            steps: self.steps,
        })
    }
}
