//! # Validation Pipeline
//!
//! An ordered list of named checks, each tagged with what happens when it
//! fails: [`OnFailure::Halt`] stops the pipeline, [`OnFailure::Continue`]
//! records the errors and moves on. Errors from every executed step are
//! merged in step order.

use crate::domain::ValidationResult;

/// Policy applied when a step reports errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    Halt,
    Continue,
}

/// One named check over a context `C`.
pub struct ValidationStep<C> {
    pub name: &'static str,
    pub on_failure: OnFailure,
    pub check: fn(&C) -> ValidationResult,
}

/// Result of running a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub result: ValidationResult,
    /// Steps that ran, in order.
    pub executed: Vec<&'static str>,
    /// Step whose failure stopped the pipeline.
    pub halted_at: Option<&'static str>,
}

/// Ordered checks over one context type.
pub struct ValidationPipeline<C> {
    steps: Vec<ValidationStep<C>>,
}

impl<C> ValidationPipeline<C> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step that stops the pipeline on failure.
    pub fn halt_on_failure(mut self, name: &'static str, check: fn(&C) -> ValidationResult) -> Self {
        self.steps.push(ValidationStep {
            name,
            on_failure: OnFailure::Halt,
            check,
        });
        self
    }

    /// Append a step whose failure is recorded without stopping.
    pub fn continue_on_failure(
        mut self,
        name: &'static str,
        check: fn(&C) -> ValidationResult,
    ) -> Self {
        self.steps.push(ValidationStep {
            name,
            on_failure: OnFailure::Continue,
            check,
        });
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name).collect()
    }

    pub fn run(&self, context: &C) -> PipelineOutcome {
        let mut result = ValidationResult::new();
        let mut executed = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            executed.push(step.name);
            let step_result = (step.check)(context);
            let failed = !step_result.is_valid();
            result.merge(step_result);
            if failed && step.on_failure == OnFailure::Halt {
                return PipelineOutcome {
                    result,
                    executed,
                    halted_at: Some(step.name),
                };
            }
        }

        PipelineOutcome {
            result,
            executed,
            halted_at: None,
        }
    }
}

impl<C> Default for ValidationPipeline<C> {
    fn default() -> Self {
        Self::new()
    }
}
