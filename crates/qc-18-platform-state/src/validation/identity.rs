//! # Identity Validation
//!
//! Identity transitions are funded by an asset lock proof. The proof type
//! is checked before anything else so an unknown discriminant is rejected
//! without touching chain state.

use super::asset_lock::{check_proof_schema, check_proof_type, verify_asset_lock_proof};
use super::basic::{check_protocol_version, BasicContext};
use super::pipeline::ValidationPipeline;
use crate::config::PlatformConfig;
use crate::domain::{
    ConsensusError, IdentityCreateTransition, IdentityPublicKey, IdentityTopUpTransition,
    LockedOutput, PlatformError, ValidationResult,
};
use crate::ports::outbound::StateRepository;
use crate::schema::SchemaKind;
use std::collections::HashSet;
use tracing::debug;

pub(crate) fn create_basic_pipeline<'a>() -> ValidationPipeline<BasicContext<'a>> {
    ValidationPipeline::new()
        .halt_on_failure("identity_create_schema", check_create_schema)
        .halt_on_failure("protocol_version", check_protocol_version)
        .halt_on_failure("asset_lock_proof_type", check_proof_type)
        .halt_on_failure("asset_lock_proof_schema", check_proof_schema)
        .continue_on_failure("public_keys", check_public_keys)
}

pub(crate) fn top_up_basic_pipeline<'a>() -> ValidationPipeline<BasicContext<'a>> {
    ValidationPipeline::new()
        .halt_on_failure("identity_top_up_schema", check_top_up_schema)
        .halt_on_failure("protocol_version", check_protocol_version)
        .halt_on_failure("asset_lock_proof_type", check_proof_type)
        .halt_on_failure("asset_lock_proof_schema", check_proof_schema)
}

fn check_create_schema(context: &BasicContext<'_>) -> ValidationResult {
    context
        .schemas
        .validate_static(SchemaKind::IdentityCreate, context.raw)
}

fn check_top_up_schema(context: &BasicContext<'_>) -> ValidationResult {
    context
        .schemas
        .validate_static(SchemaKind::IdentityTopUp, context.raw)
}

fn check_public_keys(context: &BasicContext<'_>) -> ValidationResult {
    let keys: Vec<IdentityPublicKey> =
        match serde_json::from_value(context.raw["publicKeys"].clone()) {
            Ok(keys) => keys,
            Err(e) => {
                return ValidationResult::with_error(ConsensusError::JsonSchema {
                    message: e.to_string(),
                })
            }
        };
    validate_public_keys(&keys)
}

/// Structural rules over a key set.
pub fn validate_public_keys(keys: &[IdentityPublicKey]) -> ValidationResult {
    let mut result = ValidationResult::new();

    let mut ids = HashSet::new();
    let duplicated_ids: Vec<u32> = keys
        .iter()
        .filter(|key| !ids.insert(key.id))
        .map(|key| key.id)
        .collect();
    if !duplicated_ids.is_empty() {
        result.add_error(ConsensusError::DuplicatedIdentityPublicKeyId(duplicated_ids));
    }

    let mut data = HashSet::new();
    let duplicated_data: Vec<u32> = keys
        .iter()
        .filter(|key| !data.insert(key.data.as_slice()))
        .map(|key| key.id)
        .collect();
    if !duplicated_data.is_empty() {
        result.add_error(ConsensusError::DuplicatedIdentityPublicKey(duplicated_data));
    }

    for key in keys {
        if let Err(message) = key.validate_data() {
            result.add_error(ConsensusError::InvalidIdentityPublicKeyData {
                key_id: key.id,
                message,
            });
        }
    }
    result
}

/// State checks for identity creation.
///
/// The proof is verified first and halts on failure. The locked output is
/// attached as result data.
pub async fn validate_identity_create_state(
    transition: &IdentityCreateTransition,
    repository: &dyn StateRepository,
    config: &PlatformConfig,
) -> Result<ValidationResult<LockedOutput>, PlatformError> {
    let proof_result =
        verify_asset_lock_proof(&transition.asset_lock_proof, repository, config).await?;
    if !proof_result.is_valid() {
        return Ok(proof_result);
    }
    let Some(locked) = proof_result.into_data() else {
        return Ok(ValidationResult::new());
    };

    let mut result = ValidationResult::new();
    let identity_id = transition.identity_id();
    if repository.fetch_identity(&identity_id).await?.is_some() {
        result.add_error(ConsensusError::IdentityAlreadyExists(identity_id));
    }

    let hashes: Vec<_> = transition
        .public_keys
        .iter()
        .filter_map(|key| key.hash().ok())
        .collect();
    if !hashes.contains(&locked.public_key_hash) {
        result.add_error(ConsensusError::AssetLockPublicKeyHashMismatch(
            locked.public_key_hash,
        ));
    }

    let registered = repository
        .fetch_identity_ids_by_public_key_hashes(&hashes)
        .await?;
    for hash in &hashes {
        if registered.contains_key(hash) {
            result.add_error(ConsensusError::IdentityPublicKeyAlreadyExists(*hash));
        }
    }

    debug!(
        identity_id = %identity_id,
        errors = result.errors().len(),
        "Identity create state validated"
    );
    result.set_data(locked);
    Ok(result)
}

/// State checks for a top-up: the target exists and the proof holds.
pub async fn validate_identity_top_up_state(
    transition: &IdentityTopUpTransition,
    repository: &dyn StateRepository,
    config: &PlatformConfig,
) -> Result<ValidationResult<LockedOutput>, PlatformError> {
    if repository
        .fetch_identity(&transition.identity_id)
        .await?
        .is_none()
    {
        return Ok(ValidationResult::with_error(
            ConsensusError::IdentityNotFound(transition.identity_id),
        ));
    }
    verify_asset_lock_proof(&transition.asset_lock_proof, repository, config).await
}
