//! The step contract and its control-flow outcomes.

use crate::pipeline::ParamBag;

/// Error type a step reports for a domain-level failure.
///
/// Step failures are propagated unchanged to the pipeline caller; the
/// engine never retries them.
pub type StepFailure = Box<dyn std::error::Error + Send + Sync>;

/// Control-flow instruction a step returns, determining what the engine
/// does next.
///
/// Jump and loop targets name another step by its id. A jump target must
/// occur strictly *after* the current step; a loop target must occur *at
/// or before* it. Violations are configuration errors that abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Proceed to the next step in declared order.
    Continue,
    /// Terminate the pipeline successfully; the response stands as last
    /// produced.
    Stop,
    /// Continue execution at the named later step, skipping everything in
    /// between.
    JumpTo(String),
    /// Re-run the pipeline from its first step. The parameter bag is kept:
    /// a restart is a retry with adjusted parameters, not a fresh run.
    Restart,
    /// Resume at the named earlier step, forming a bounded loop.
    LoopTo(String),
}

impl StepOutcome {
    /// Convenience constructor for [`StepOutcome::JumpTo`].
    pub fn jump_to(id: impl Into<String>) -> Self {
        Self::JumpTo(id.into())
    }

    /// Convenience constructor for [`StepOutcome::LoopTo`].
    pub fn loop_to(id: impl Into<String>) -> Self {
        Self::LoopTo(id.into())
    }
}

/// A named unit of work within a pipeline.
///
/// Steps own no persistent state between invocations; anything a step
/// wants later steps (or a later iteration of itself) to observe goes
/// into the [`ParamBag`], which is created fresh per run and owned
/// exclusively by that run.
pub trait PipelineStep<Req, Res>: Send + Sync {
    /// Identifier of this step, unique within its pipeline.
    fn id(&self) -> &str;

    /// Perform the step's work against the request/response pair.
    fn execute(
        &self,
        request: &Req,
        params: &mut ParamBag,
        response: &mut Res,
    ) -> Result<StepOutcome, StepFailure>;
}

/// Closure-backed step, for small steps and for tests.
pub struct FnStep<Req, Res> {
    id: String,
    #[allow(clippy::type_complexity)]
    run: Box<
        dyn Fn(&Req, &mut ParamBag, &mut Res) -> Result<StepOutcome, StepFailure> + Send + Sync,
    >,
}

impl<Req, Res> FnStep<Req, Res> {
    /// Create a step from an id and a closure.
    pub fn new<F>(id: impl Into<String>, run: F) -> Self
    where
        F: Fn(&Req, &mut ParamBag, &mut Res) -> Result<StepOutcome, StepFailure>
            + Send
            + Sync
            + 'static,
    {
        Self {
            id: id.into(),
            run: Box::new(run),
        }
    }
}

impl<Req, Res> PipelineStep<Req, Res> for FnStep<Req, Res> {
    fn id(&self) -> &str {
        &self.id
    }

    fn execute(
        &self,
        request: &Req,
        params: &mut ParamBag,
        response: &mut Res,
    ) -> Result<StepOutcome, StepFailure> {
        (self.run)(request, params, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        assert_eq!(
            StepOutcome::jump_to("encode"),
            StepOutcome::JumpTo("encode".to_string())
        );
        assert_eq!(
            StepOutcome::loop_to("fetch"),
            StepOutcome::LoopTo("fetch".to_string())
        );
    }

    #[test]
    fn test_fn_step_executes_closure() {
        let step: FnStep<u32, Vec<u32>> = FnStep::new("double", |req, _params, res: &mut Vec<u32>| {
            res.push(req * 2);
            Ok(StepOutcome::Continue)
        });

        let mut params = ParamBag::new();
        let mut response = Vec::new();
        let outcome = step.execute(&21, &mut params, &mut response).unwrap();

        assert_eq!(step.id(), "double");
        assert_eq!(outcome, StepOutcome::Continue);
        assert_eq!(response, vec![42]);
    }
}
