//! # Driving Ports (API - Inbound)
//!
//! The consensus surface used by block producers and validators. Raw wire
//! objects enter through [`PlatformStateApi::process`] or stage by stage.

use crate::domain::{ConsensusError, PlatformError, StateTransition, ValidationResult};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Stage that rejected a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStage {
    Basic,
    State,
    DataTriggers,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::State => "state",
            Self::DataTriggers => "data_triggers",
        };
        f.write_str(name)
    }
}

/// Result of running a raw transition through every stage.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Passed every stage and mutated state.
    Applied(StateTransition),
    /// Halted with the full ordered error set of the failing stage.
    Rejected {
        stage: ProcessingStage,
        errors: Vec<ConsensusError>,
    },
}

impl ProcessOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Consensus errors, empty when applied.
    pub fn errors(&self) -> &[ConsensusError] {
        match self {
            Self::Applied(_) => &[],
            Self::Rejected { errors, .. } => errors,
        }
    }

    /// Stable codes of the consensus errors.
    pub fn error_codes(&self) -> Vec<u32> {
        self.errors().iter().map(ConsensusError::code).collect()
    }
}

/// Primary API for platform state transitions.
#[async_trait]
pub trait PlatformStateApi: Send + Sync {
    /// Structural checks on an untrusted wire object. The decoded transition
    /// is the result data on success.
    fn validate_basic(&self, raw: &Value) -> ValidationResult<StateTransition>;

    /// Checks against current state.
    async fn validate_state(
        &self,
        transition: &StateTransition,
    ) -> Result<ValidationResult, PlatformError>;

    /// Contract-specific rules. Only documents batches have triggers.
    async fn validate_data_triggers(
        &self,
        transition: &StateTransition,
    ) -> Result<ValidationResult, PlatformError>;

    /// Mutate state for a fully validated transition.
    async fn apply(&self, transition: &StateTransition) -> Result<(), PlatformError>;

    /// basic → state → data triggers → apply, stopping at the first
    /// failing stage.
    async fn process(&self, raw: &Value) -> Result<ProcessOutcome, PlatformError>;
}
