//! # Platform State Service
//!
//! Wires the validators, trigger registry and apply engine behind
//! [`PlatformStateApi`]. One service owns its schema cache and pattern
//! engine; the repository is shared.

use crate::adapters::JsonSchemaValidator;
use crate::apply::apply_state_transition;
use crate::config::{PlatformConfig, DEFAULT_REGEX_SIZE_LIMIT};
use crate::domain::{ConsensusError, PlatformError, StateTransition, ValidationResult};
use crate::ports::inbound::{PlatformStateApi, ProcessOutcome, ProcessingStage};
use crate::ports::outbound::StateRepository;
use crate::schema::PatternEngine;
use crate::triggers::DataTriggerRegistry;
use crate::validation::{validate_basic, validate_state};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters for processed transitions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    pub processed: u64,
    pub applied: u64,
    pub rejected_basic: u64,
    pub rejected_state: u64,
    pub rejected_data_triggers: u64,
}

/// The platform state transition service.
pub struct PlatformStateService<R: StateRepository> {
    config: PlatformConfig,
    repository: Arc<R>,
    schemas: JsonSchemaValidator,
    patterns: Arc<PatternEngine>,
    triggers: DataTriggerRegistry,
    stats: RwLock<ServiceStats>,
}

impl<R: StateRepository> PlatformStateService<R> {
    /// Compile the static schemas, bring up the pattern engine and bind
    /// the system contract triggers named in `config`.
    pub async fn initialize(repository: Arc<R>, config: PlatformConfig) -> Result<Self, PlatformError> {
        let schemas = JsonSchemaValidator::new()?;
        let patterns = if config.regex_size_limit == DEFAULT_REGEX_SIZE_LIMIT {
            PatternEngine::shared().await
        } else {
            Arc::new(PatternEngine::initialize(config.regex_size_limit).await)
        };
        let triggers = DataTriggerRegistry::from_system_contracts(&config);
        info!(
            protocol_version = config.latest_protocol_version,
            data_triggers = triggers.len(),
            "Platform state service initialized"
        );
        Ok(Self {
            config,
            repository,
            schemas,
            patterns,
            triggers,
            stats: RwLock::new(ServiceStats::default()),
        })
    }

    /// Replace the trigger registry.
    pub fn with_data_triggers(mut self, triggers: DataTriggerRegistry) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats.read().clone()
    }

    fn reject(&self, stage: ProcessingStage, errors: Vec<ConsensusError>) -> ProcessOutcome {
        {
            let mut stats = self.stats.write();
            match stage {
                ProcessingStage::Basic => stats.rejected_basic += 1,
                ProcessingStage::State => stats.rejected_state += 1,
                ProcessingStage::DataTriggers => stats.rejected_data_triggers += 1,
            }
        }
        let codes: Vec<u32> = errors.iter().map(ConsensusError::code).collect();
        warn!(%stage, ?codes, "State transition rejected");
        ProcessOutcome::Rejected { stage, errors }
    }
}

#[async_trait]
impl<R: StateRepository + 'static> PlatformStateApi for PlatformStateService<R> {
    fn validate_basic(&self, raw: &Value) -> ValidationResult<StateTransition> {
        validate_basic(raw, &self.config, &self.schemas, &self.patterns)
    }

    async fn validate_state(
        &self,
        transition: &StateTransition,
    ) -> Result<ValidationResult, PlatformError> {
        validate_state(
            transition,
            self.repository.as_ref(),
            &self.schemas,
            &self.config,
        )
        .await
    }

    async fn validate_data_triggers(
        &self,
        transition: &StateTransition,
    ) -> Result<ValidationResult, PlatformError> {
        match transition {
            StateTransition::DocumentsBatch(batch) => {
                self.triggers.execute(batch, self.repository.as_ref()).await
            }
            _ => Ok(ValidationResult::new()),
        }
    }

    async fn apply(&self, transition: &StateTransition) -> Result<(), PlatformError> {
        apply_state_transition(transition, self.repository.as_ref()).await
    }

    async fn process(&self, raw: &Value) -> Result<ProcessOutcome, PlatformError> {
        self.stats.write().processed += 1;

        let basic = self.validate_basic(raw);
        if !basic.is_valid() {
            return Ok(self.reject(ProcessingStage::Basic, basic.into_errors()));
        }
        let Some(transition) = basic.into_data() else {
            return Err(PlatformError::Decoding {
                entity: "state transition",
                message: "basic validation produced no transition".into(),
            });
        };

        let state = self.validate_state(&transition).await?;
        if !state.is_valid() {
            return Ok(self.reject(ProcessingStage::State, state.into_errors()));
        }

        let triggers = self.validate_data_triggers(&transition).await?;
        if !triggers.is_valid() {
            return Ok(self.reject(ProcessingStage::DataTriggers, triggers.into_errors()));
        }

        self.apply(&transition).await?;
        self.stats.write().applied += 1;
        debug!(
            transition_type = %transition.transition_type(),
            owner_id = %transition.owner_id(),
            "State transition applied"
        );
        Ok(ProcessOutcome::Applied(transition))
    }
}
