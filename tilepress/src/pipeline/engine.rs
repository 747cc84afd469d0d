//! The pipeline execution engine.
//!
//! The engine is a small interpreter over a [`PipelineDefinition`]: a
//! cursor into the step sequence, a fresh [`ParamBag`], and a counter of
//! executed steps. Steps direct control flow through the
//! [`StepOutcome`] they return; the counter enforces a fixed safety
//! ceiling against `Restart`/`LoopTo` cycles that never terminate.

use tracing::{debug, warn};

use crate::pipeline::{ParamBag, PipelineDefinition, PipelineError, StepOutcome};

/// Safety ceiling on step executions per run.
///
/// Generous enough for any sane retry loop over a step sequence, small
/// enough to stop a miswired cycle quickly. Fixed at engine construction,
/// never per call.
pub const DEFAULT_STEP_LIMIT: usize = 1_000;

/// Executes pipeline definitions against request/response pairs.
///
/// The engine is stateless across runs and safe to share: every run owns
/// its own cursor, counter, and parameter bag.
#[derive(Debug, Clone)]
pub struct PipelineEngine {
    step_limit: usize,
}

impl PipelineEngine {
    /// Engine with the default step limit.
    pub fn new() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Engine with a custom step limit. Intended for embedders that know
    /// their deepest legitimate loop; individual calls cannot override it.
    pub fn with_step_limit(step_limit: usize) -> Self {
        Self { step_limit }
    }

    /// The configured safety ceiling.
    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    /// Run a pipeline to completion with a fresh parameter bag.
    ///
    /// On failure the response keeps whatever mutations completed steps
    /// applied; the engine does not roll back side effects.
    pub fn run<Req, Res>(
        &self,
        definition: &PipelineDefinition<Req, Res>,
        request: &Req,
        response: &mut Res,
    ) -> Result<(), PipelineError> {
        let mut params = ParamBag::new();
        self.run_with_params(definition, request, &mut params, response)
    }

    /// Run a pipeline to completion against a caller-seeded parameter bag.
    ///
    /// The caching-support glue relies on this: the dispatch layer seeds
    /// the bag with the request's cache-relevant context values before the
    /// run, and steps find derived keys stashed there afterwards.
    pub fn run_with_params<Req, Res>(
        &self,
        definition: &PipelineDefinition<Req, Res>,
        request: &Req,
        params: &mut ParamBag,
        response: &mut Res,
    ) -> Result<(), PipelineError> {
        let mut cursor = 0usize;
        let mut executed = 0usize;

        while cursor < definition.len() {
            executed += 1;
            if executed > self.step_limit {
                warn!(
                    pipeline = definition.name(),
                    limit = self.step_limit,
                    "aborting pipeline run: step limit exceeded"
                );
                return Err(PipelineError::StepLimitExceeded {
                    pipeline: definition.name().to_string(),
                    limit: self.step_limit,
                });
            }

            let step = &definition.steps()[cursor];
            let outcome = step.execute(request, params, response).map_err(|source| {
                warn!(
                    pipeline = definition.name(),
                    step = step.id(),
                    error = %source,
                    "pipeline step failed"
                );
                PipelineError::StepFailed {
                    step: step.id().to_string(),
                    source,
                }
            })?;

            debug!(
                pipeline = definition.name(),
                step = step.id(),
                outcome = ?outcome,
                "pipeline step executed"
            );

            match outcome {
                StepOutcome::Continue => cursor += 1,
                StepOutcome::Stop => return Ok(()),
                StepOutcome::JumpTo(target) => match definition.position_of(&target) {
                    Some(position) if position > cursor => cursor = position,
                    _ => {
                        return Err(PipelineError::JumpTargetNotFound {
                            step: step.id().to_string(),
                            target,
                        })
                    }
                },
                StepOutcome::Restart => cursor = 0,
                StepOutcome::LoopTo(target) => match definition.position_of(&target) {
                    Some(position) if position <= cursor => cursor = position,
                    _ => {
                        return Err(PipelineError::LoopTargetNotFound {
                            step: step.id().to_string(),
                            target,
                        })
                    }
                },
            }
        }

        Ok(())
    }
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FnStep, PipelineBuilder, StepFailure};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Step that appends its id to the response trace and returns a fixed
    /// outcome.
    fn trace_step(id: &str, outcome: StepOutcome) -> FnStep<(), Vec<String>> {
        let step_id = id.to_string();
        FnStep::new(id, move |_req, _params, trace: &mut Vec<String>| {
            trace.push(step_id.clone());
            Ok(outcome.clone())
        })
    }

    fn run_trace(
        pipeline: &PipelineDefinition<(), Vec<String>>,
    ) -> (Result<(), PipelineError>, Vec<String>) {
        let mut trace = Vec::new();
        let result = PipelineEngine::new().run(pipeline, &(), &mut trace);
        (result, trace)
    }

    #[test]
    fn test_linear_pipeline_visits_every_step_once() {
        let pipeline = PipelineBuilder::new("linear")
            .step(trace_step("a", StepOutcome::Continue))
            .step(trace_step("b", StepOutcome::Continue))
            .step(trace_step("c", StepOutcome::Continue))
            .build()
            .unwrap();

        let (result, trace) = run_trace(&pipeline);
        assert!(result.is_ok());
        assert_eq!(trace, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_stop_terminates_immediately() {
        let pipeline = PipelineBuilder::new("stops")
            .step(trace_step("a", StepOutcome::Continue))
            .step(trace_step("b", StepOutcome::Stop))
            .step(trace_step("c", StepOutcome::Continue))
            .build()
            .unwrap();

        let (result, trace) = run_trace(&pipeline);
        assert!(result.is_ok());
        assert_eq!(trace, vec!["a", "b"], "steps after Stop must not execute");
    }

    #[test]
    fn test_jump_skips_intermediate_steps() {
        let pipeline = PipelineBuilder::new("jumps")
            .step(trace_step("a", StepOutcome::jump_to("d")))
            .step(trace_step("b", StepOutcome::Continue))
            .step(trace_step("c", StepOutcome::Continue))
            .step(trace_step("d", StepOutcome::Continue))
            .build()
            .unwrap();

        let (result, trace) = run_trace(&pipeline);
        assert!(result.is_ok());
        assert_eq!(trace, vec!["a", "d"], "skipped steps must not execute");
    }

    #[test]
    fn test_jump_to_unknown_step_is_configuration_error() {
        let pipeline = PipelineBuilder::new("bad-jump")
            .step(trace_step("a", StepOutcome::jump_to("nowhere")))
            .build()
            .unwrap();

        let (result, _) = run_trace(&pipeline);
        match result {
            Err(PipelineError::JumpTargetNotFound { step, target }) => {
                assert_eq!(step, "a");
                assert_eq!(target, "nowhere");
            }
            other => panic!("expected JumpTargetNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_jump_backwards_is_configuration_error() {
        let pipeline = PipelineBuilder::new("backward-jump")
            .step(trace_step("a", StepOutcome::Continue))
            .step(trace_step("b", StepOutcome::jump_to("a")))
            .build()
            .unwrap();

        let (result, _) = run_trace(&pipeline);
        assert!(
            matches!(result, Err(PipelineError::JumpTargetNotFound { .. })),
            "a jump target must occur strictly after the current step"
        );
    }

    #[test]
    fn test_jump_to_self_is_configuration_error() {
        let pipeline = PipelineBuilder::new("self-jump")
            .step(trace_step("a", StepOutcome::jump_to("a")))
            .build()
            .unwrap();

        let (result, _) = run_trace(&pipeline);
        assert!(matches!(
            result,
            Err(PipelineError::JumpTargetNotFound { .. })
        ));
    }

    #[test]
    fn test_loop_reexecutes_from_target() {
        // "check" loops back to "work" twice, then continues.
        let iterations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&iterations);

        let pipeline = PipelineBuilder::new("loops")
            .step(trace_step("work", StepOutcome::Continue))
            .step(FnStep::new(
                "check",
                move |_req, _params, trace: &mut Vec<String>| {
                    trace.push("check".to_string());
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Ok(StepOutcome::loop_to("work"))
                    } else {
                        Ok(StepOutcome::Continue)
                    }
                },
            ))
            .step(trace_step("finish", StepOutcome::Continue))
            .build()
            .unwrap();

        let (result, trace) = run_trace(&pipeline);
        assert!(result.is_ok());
        assert_eq!(
            trace,
            vec!["work", "check", "work", "check", "work", "check", "finish"]
        );
    }

    #[test]
    fn test_loop_forward_is_configuration_error() {
        let pipeline = PipelineBuilder::new("forward-loop")
            .step(trace_step("a", StepOutcome::loop_to("b")))
            .step(trace_step("b", StepOutcome::Continue))
            .build()
            .unwrap();

        let (result, _) = run_trace(&pipeline);
        assert!(
            matches!(result, Err(PipelineError::LoopTargetNotFound { .. })),
            "a loop target must occur at or before the current step"
        );
    }

    #[test]
    fn test_loop_to_self_is_allowed() {
        let spins = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&spins);

        let pipeline = PipelineBuilder::new("self-loop")
            .step(FnStep::new("spin", move |_req, _params, _res: &mut ()| {
                if counter.fetch_add(1, Ordering::SeqCst) < 4 {
                    Ok(StepOutcome::loop_to("spin"))
                } else {
                    Ok(StepOutcome::Stop)
                }
            }))
            .build()
            .unwrap();

        let result = PipelineEngine::new().run(&pipeline, &(), &mut ());
        assert!(result.is_ok());
        assert_eq!(spins.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_unbounded_loop_hits_step_limit() {
        let executed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&executed);

        let pipeline = PipelineBuilder::new("runaway")
            .step(FnStep::new("spin", move |_req, _params, _res: &mut ()| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(StepOutcome::loop_to("spin"))
            }))
            .build()
            .unwrap();

        let engine = PipelineEngine::with_step_limit(25);
        let result = engine.run(&pipeline, &(), &mut ());
        match result {
            Err(PipelineError::StepLimitExceeded { pipeline, limit }) => {
                assert_eq!(pipeline, "runaway");
                assert_eq!(limit, 25);
            }
            other => panic!("expected StepLimitExceeded, got {:?}", other),
        }
        assert_eq!(
            executed.load(Ordering::SeqCst),
            25,
            "no step may execute past the ceiling"
        );
    }

    #[test]
    fn test_restart_keeps_parameter_bag() {
        // First pass sets a flag and restarts; second pass observes the
        // flag and finishes. Restart is a retry with adjusted parameters.
        let pipeline = PipelineBuilder::new("restarts")
            .step(FnStep::new(
                "attempt",
                |_req, params: &mut ParamBag, trace: &mut Vec<String>| {
                    if params.contains("retried") {
                        trace.push("attempt-2".to_string());
                        Ok(StepOutcome::Continue)
                    } else {
                        trace.push("attempt-1".to_string());
                        params.insert("retried", true);
                        Ok(StepOutcome::Restart)
                    }
                },
            ))
            .step(trace_step("finish", StepOutcome::Continue))
            .build()
            .unwrap();

        let (result, trace) = run_trace(&pipeline);
        assert!(result.is_ok());
        assert_eq!(trace, vec!["attempt-1", "attempt-2", "finish"]);
    }

    #[test]
    fn test_step_failure_aborts_and_keeps_partial_response() {
        let pipeline = PipelineBuilder::new("fails")
            .step(trace_step("a", StepOutcome::Continue))
            .step(FnStep::new(
                "explode",
                |_req, _params, trace: &mut Vec<String>| {
                    trace.push("explode".to_string());
                    Err::<StepOutcome, StepFailure>("invalid geometry".into())
                },
            ))
            .step(trace_step("c", StepOutcome::Continue))
            .build()
            .unwrap();

        let (result, trace) = run_trace(&pipeline);
        match result {
            Err(PipelineError::StepFailed { step, source }) => {
                assert_eq!(step, "explode");
                assert_eq!(source.to_string(), "invalid geometry");
            }
            other => panic!("expected StepFailed, got {:?}", other),
        }
        assert_eq!(
            trace,
            vec!["a", "explode"],
            "partially mutated response is returned; later steps never run"
        );
    }

    #[test]
    fn test_empty_pipeline_succeeds() {
        let pipeline = PipelineBuilder::<(), ()>::new("empty").build().unwrap();
        assert!(PipelineEngine::new().run(&pipeline, &(), &mut ()).is_ok());
    }

    #[test]
    fn test_definition_is_shareable_across_threads() {
        let pipeline = Arc::new(
            PipelineBuilder::new("shared")
                .step(trace_step("a", StepOutcome::Continue))
                .step(trace_step("b", StepOutcome::Continue))
                .build()
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let definition = Arc::clone(&pipeline);
                std::thread::spawn(move || {
                    let mut trace = Vec::new();
                    PipelineEngine::new()
                        .run(&definition, &(), &mut trace)
                        .unwrap();
                    trace
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec!["a", "b"]);
        }
    }
}
