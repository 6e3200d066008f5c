//! # Data Triggers
//!
//! Contract-specific rules run against document transitions after state
//! validation. Triggers are looked up by `(contract id, document type,
//! action)` in a registry built once and never mutated.
//!
//! | Contract | Type | Action | Trigger |
//! |----------|------|--------|---------|
//! | name service | `domain` | create | [`DomainCreateTrigger`] |
//! | name service | `domain`, `preorder` | replace, delete | [`RejectTrigger`] |
//! | feature flags | `updateConsensusParams` | create | [`FeatureFlagCreateTrigger`] |
//!
//! A transition with no registered trigger is unconstrained.

pub mod dpns;
pub mod feature_flags;
pub mod reject;

pub use dpns::DomainCreateTrigger;
pub use feature_flags::FeatureFlagCreateTrigger;
pub use reject::RejectTrigger;

use crate::config::PlatformConfig;
use crate::domain::{
    ConsensusError, DataContract, DocumentAction, DocumentTransition, DocumentsBatchTransition,
    PlatformError, ValidationResult,
};
use crate::ports::outbound::{RepositoryError, StateRepository};
use async_trait::async_trait;
use futures::FutureExt;
use shared_types::Identifier;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

// =============================================================================
// TRIGGER CONTRACT
// =============================================================================

/// Failure while running a trigger.
#[derive(Debug, Error)]
pub enum DataTriggerError {
    /// The trigger could not produce a structured result.
    #[error("Malformed trigger result: {0}")]
    MalformedResult(String),

    /// The document lacks data the trigger needs.
    #[error("Invalid document data: {0}")]
    InvalidDocument(String),

    /// A repository lookup failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Read-only view handed to triggers.
pub struct DataTriggerContext<'a> {
    pub contract: &'a DataContract,
    /// Submitter of the batch.
    pub owner_id: &'a Identifier,
    pub repository: &'a dyn StateRepository,
}

/// Condition failures reported by one trigger run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTriggerExecutionResult {
    errors: Vec<ConsensusError>,
}

impl DataTriggerExecutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed condition for `transition`.
    pub fn fail(
        &mut self,
        context: &DataTriggerContext<'_>,
        transition: &DocumentTransition,
        message: impl Into<String>,
    ) {
        self.errors.push(ConsensusError::DataTriggerCondition {
            data_contract_id: context.contract.id,
            document_id: transition.id(),
            message: message.into(),
        });
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ConsensusError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ConsensusError> {
        self.errors
    }
}

/// A contract-specific rule over one document transition.
#[async_trait]
pub trait DataTrigger: Send + Sync {
    /// Name reported in execution errors.
    fn name(&self) -> &'static str;

    /// Evaluate `transition`. `top_level_identity` is the system identity
    /// bound with this trigger, if any.
    async fn execute(
        &self,
        transition: &DocumentTransition,
        context: &DataTriggerContext<'_>,
        top_level_identity: Option<&Identifier>,
    ) -> Result<DataTriggerExecutionResult, DataTriggerError>;
}

// =============================================================================
// REGISTRY
// =============================================================================

type TriggerKey = (Identifier, String, DocumentAction);

/// A trigger together with the identity it was registered for.
#[derive(Clone)]
pub struct DataTriggerBinding {
    pub trigger: Arc<dyn DataTrigger>,
    pub top_level_identity: Option<Identifier>,
}

/// Static trigger lookup table.
#[derive(Clone, Default)]
pub struct DataTriggerRegistry {
    bindings: HashMap<TriggerKey, Vec<DataTriggerBinding>>,
}

/// Accumulates bindings before freezing them into a registry.
#[derive(Default)]
pub struct DataTriggerRegistryBuilder {
    bindings: HashMap<TriggerKey, Vec<DataTriggerBinding>>,
}

impl DataTriggerRegistryBuilder {
    /// Register `trigger` for one (contract, type, action).
    pub fn bind(
        mut self,
        contract_id: Identifier,
        document_type: &str,
        action: DocumentAction,
        trigger: Arc<dyn DataTrigger>,
        top_level_identity: Option<Identifier>,
    ) -> Self {
        self.bindings
            .entry((contract_id, document_type.to_string(), action))
            .or_default()
            .push(DataTriggerBinding {
                trigger,
                top_level_identity,
            });
        self
    }

    pub fn build(self) -> DataTriggerRegistry {
        DataTriggerRegistry {
            bindings: self.bindings,
        }
    }
}

impl DataTriggerRegistry {
    pub fn builder() -> DataTriggerRegistryBuilder {
        DataTriggerRegistryBuilder::default()
    }

    /// Registry with the shipped triggers for every configured system
    /// contract.
    pub fn from_system_contracts(config: &PlatformConfig) -> Self {
        let mut builder = Self::builder();

        if let Some(dpns) = config.dpns {
            let reject: Arc<dyn DataTrigger> = Arc::new(RejectTrigger);
            builder = builder.bind(
                dpns.contract_id,
                dpns::DOMAIN,
                DocumentAction::Create,
                Arc::new(DomainCreateTrigger),
                Some(dpns.system_identity_id),
            );
            for document_type in [dpns::DOMAIN, dpns::PREORDER] {
                for action in [DocumentAction::Replace, DocumentAction::Delete] {
                    builder = builder.bind(
                        dpns.contract_id,
                        document_type,
                        action,
                        Arc::clone(&reject),
                        None,
                    );
                }
            }
        }

        if let Some(flags) = config.feature_flags {
            builder = builder.bind(
                flags.contract_id,
                feature_flags::UPDATE_CONSENSUS_PARAMS,
                DocumentAction::Create,
                Arc::new(FeatureFlagCreateTrigger),
                Some(flags.system_identity_id),
            );
        }

        let registry = builder.build();
        debug!(bindings = registry.len(), "Data trigger registry built");
        registry
    }

    /// Bindings for one (contract, type, action).
    pub fn triggers_for(
        &self,
        contract_id: &Identifier,
        document_type: &str,
        action: DocumentAction,
    ) -> &[DataTriggerBinding] {
        self.bindings
            .get(&(*contract_id, document_type.to_string(), action))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of (contract, type, action) keys with triggers.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Run every matching trigger over every sub-transition of `batch`.
    ///
    /// Transitions whose contract is missing are skipped; state validation
    /// reports those. Repository failures inside a trigger abort the run.
    /// A trigger that panics is reported as having produced no result.
    pub async fn execute(
        &self,
        batch: &DocumentsBatchTransition,
        repository: &dyn StateRepository,
    ) -> Result<ValidationResult, PlatformError> {
        let mut result = ValidationResult::new();
        let mut contracts: HashMap<Identifier, Option<DataContract>> = HashMap::new();

        for transition in &batch.transitions {
            let contract_id = transition.data_contract_id();
            let bindings =
                self.triggers_for(&contract_id, transition.document_type(), transition.action());
            if bindings.is_empty() {
                continue;
            }

            if !contracts.contains_key(&contract_id) {
                let contract = repository.fetch_data_contract(&contract_id).await?;
                contracts.insert(contract_id, contract);
            }
            let Some(Some(contract)) = contracts.get(&contract_id) else {
                continue;
            };

            let context = DataTriggerContext {
                contract,
                owner_id: &batch.owner_id,
                repository,
            };
            for binding in bindings {
                let name = binding.trigger.name();
                let run = binding
                    .trigger
                    .execute(transition, &context, binding.top_level_identity.as_ref());
                let outcome = match AssertUnwindSafe(run).catch_unwind().await {
                    Ok(Err(DataTriggerError::Repository(error))) => {
                        warn!(trigger = name, %error, "Data trigger repository lookup failed");
                        return Err(error.into());
                    }
                    Ok(outcome) => outcome,
                    Err(payload) => Err(DataTriggerError::MalformedResult(format!(
                        "trigger panicked: {}",
                        panic_message(payload.as_ref())
                    ))),
                };
                result.add_errors(map_outcome(name, &context, transition, outcome));
            }
        }

        debug!(
            owner_id = %batch.owner_id,
            errors = result.errors().len(),
            "Data triggers executed"
        );
        Ok(result)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn map_outcome(
    trigger: &'static str,
    context: &DataTriggerContext<'_>,
    transition: &DocumentTransition,
    outcome: Result<DataTriggerExecutionResult, DataTriggerError>,
) -> Vec<ConsensusError> {
    match outcome {
        Ok(result) => result.into_errors(),
        Err(DataTriggerError::MalformedResult(message)) => {
            warn!(trigger, %message, "Data trigger returned a malformed result");
            vec![ConsensusError::DataTriggerInvalidResult {
                trigger: trigger.to_string(),
                data_contract_id: context.contract.id,
                document_id: transition.id(),
            }]
        }
        Err(error) => {
            warn!(trigger, %error, "Data trigger failed");
            vec![ConsensusError::DataTriggerExecution {
                trigger: trigger.to_string(),
                data_contract_id: context.contract.id,
                document_id: transition.id(),
                message: error.to_string(),
            }]
        }
    }
}
