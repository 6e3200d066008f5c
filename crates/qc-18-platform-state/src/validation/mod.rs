//! # Validation
//!
//! | Stage | Input | Module |
//! |-------|-------|--------|
//! | Basic | raw wire object | [`basic`], per-kind pipelines |
//! | State | decoded transition + repository | [`validate_state`] |
//! | Asset locks | decoded proof + chain state | [`asset_lock`] |

pub mod asset_lock;
pub mod basic;
pub mod data_contract;
pub mod documents;
pub mod identity;
pub mod pipeline;

pub use asset_lock::{resolve_locked_output, verify_asset_lock_proof};
pub use basic::{validate_basic, BasicContext};
pub use pipeline::{OnFailure, PipelineOutcome, ValidationPipeline, ValidationStep};

use crate::config::PlatformConfig;
use crate::domain::{PlatformError, StateTransition, ValidationResult};
use crate::ports::outbound::{SchemaValidator, StateRepository};
use tracing::debug;

/// Validate a decoded transition against current state.
pub async fn validate_state(
    transition: &StateTransition,
    repository: &dyn StateRepository,
    schemas: &dyn SchemaValidator,
    config: &PlatformConfig,
) -> Result<ValidationResult, PlatformError> {
    let result = match transition {
        StateTransition::DataContractCreate(st) => {
            data_contract::validate_data_contract_create_state(st, repository).await?
        }
        StateTransition::DocumentsBatch(st) => {
            documents::validate_documents_batch_state(st, repository, schemas, config).await?
        }
        StateTransition::IdentityCreate(st) => {
            identity::validate_identity_create_state(st, repository, config)
                .await?
                .without_data()
        }
        StateTransition::IdentityTopUp(st) => {
            identity::validate_identity_top_up_state(st, repository, config)
                .await?
                .without_data()
        }
    };
    debug!(
        transition_type = %transition.transition_type(),
        errors = result.errors().len(),
        "State validation finished"
    );
    Ok(result)
}
