//! # Asset Lock Proof Verification
//!
//! | Proof | Checks, in order |
//! |-------|------------------|
//! | Instant | transaction parses, output exists and carries data, lock parses, lock txid matches, outpoint unused, lock signature, key hash length |
//! | Chain | proof height not ahead of platform, transaction known, chain-locked (or confirmed with opt-in), output checks, outpoint unused, key hash length |
//!
//! The discriminant and proof shape are checked during basic validation so
//! an unknown proof type never reaches the chain-state collaborator.

use super::basic::BasicContext;
use crate::config::PlatformConfig;
use crate::domain::{
    AssetLockProof, AssetLockProofType, ChainAssetLockProof, ConsensusError,
    InstantAssetLockProof, InstantLock, Layer1Transaction, LockedOutput, OutPoint, PlatformError,
    ValidationResult,
};
use crate::ports::outbound::StateRepository;
use crate::schema::SchemaKind;
use serde_json::Value;
use shared_types::PublicKeyHash;
use tracing::debug;

// =============================================================================
// BASIC STEPS
// =============================================================================

fn raw_proof<'v>(context: &'v BasicContext<'_>) -> &'v Value {
    &context.raw["assetLockProof"]
}

/// Proof discriminant must be a known type.
pub(crate) fn check_proof_type(context: &BasicContext<'_>) -> ValidationResult {
    let raw_type = raw_proof(context).get("type").and_then(Value::as_u64);
    match raw_type.map(AssetLockProofType::try_from) {
        Some(Ok(_)) => ValidationResult::new(),
        Some(Err(unknown)) => {
            ValidationResult::with_error(ConsensusError::UnknownAssetLockProofType(Some(unknown)))
        }
        None => ValidationResult::with_error(ConsensusError::UnknownAssetLockProofType(None)),
    }
}

/// Proof body against the schema of its type.
pub(crate) fn check_proof_schema(context: &BasicContext<'_>) -> ValidationResult {
    let proof = raw_proof(context);
    let kind = match proof.get("type").and_then(Value::as_u64) {
        Some(0) => SchemaKind::InstantAssetLockProof,
        Some(1) => SchemaKind::ChainAssetLockProof,
        other => {
            return ValidationResult::with_error(ConsensusError::UnknownAssetLockProofType(other))
        }
    };
    context.schemas.validate_static(kind, proof)
}

// =============================================================================
// OUTPUT CHECKS
// =============================================================================

/// Locate the funding output and read the key hash it carries.
fn locked_output(
    raw_transaction: &[u8],
    out_point: OutPoint,
) -> Result<(u64, Vec<u8>), ConsensusError> {
    let transaction = Layer1Transaction::from_bytes(raw_transaction)
        .map_err(|e| ConsensusError::InvalidAssetLockTransaction(e.to_string()))?;
    let output = transaction
        .outputs
        .get(out_point.vout as usize)
        .ok_or(ConsensusError::InvalidAssetLockOutputIndex {
            index: out_point.vout,
            outputs: transaction.outputs.len(),
        })?;
    let payload = output
        .data_payload()
        .ok_or(ConsensusError::InvalidAssetLockTransactionOutput(
            out_point.vout,
        ))?
        .to_vec();
    Ok((output.value, payload))
}

fn public_key_hash(payload: &[u8]) -> Result<PublicKeyHash, ConsensusError> {
    payload
        .try_into()
        .map_err(|_| ConsensusError::InvalidAssetLockPublicKeyHashLength(payload.len()))
}

// =============================================================================
// VERIFICATION
// =============================================================================

/// Verify a decoded proof against chain state.
///
/// On success the [`LockedOutput`] is attached as result data. Stops at the
/// first failing check.
pub async fn verify_asset_lock_proof(
    proof: &AssetLockProof,
    repository: &dyn StateRepository,
    config: &PlatformConfig,
) -> Result<ValidationResult<LockedOutput>, PlatformError> {
    let outcome = match proof {
        AssetLockProof::Instant(proof) => verify_instant(proof, repository).await?,
        AssetLockProof::Chain(proof) => verify_chain(proof, repository, config).await?,
    };
    Ok(match outcome {
        Ok(locked) => {
            debug!(
                out_point = %hex::encode(locked.out_point.to_bytes()),
                value = locked.value,
                "Asset lock proof verified"
            );
            ValidationResult::with_data(locked)
        }
        Err(error) => {
            debug!(code = error.code(), "Asset lock proof rejected");
            ValidationResult::with_error(error)
        }
    })
}

async fn verify_instant(
    proof: &InstantAssetLockProof,
    repository: &dyn StateRepository,
) -> Result<Result<LockedOutput, ConsensusError>, PlatformError> {
    let out_point = proof.out_point();
    let (value, payload) = match locked_output(&proof.transaction, out_point) {
        Ok(found) => found,
        Err(error) => return Ok(Err(error)),
    };

    let instant_lock = match InstantLock::from_bytes(&proof.instant_lock) {
        Ok(lock) => lock,
        Err(e) => return Ok(Err(ConsensusError::InvalidInstantAssetLock(e.to_string()))),
    };
    if instant_lock.txid != out_point.txid {
        return Ok(Err(ConsensusError::InstantLockTransactionIdMismatch {
            expected: out_point.txid,
            actual: instant_lock.txid,
        }));
    }

    if repository
        .is_asset_lock_transaction_out_point_already_used(&out_point)
        .await?
    {
        return Ok(Err(ConsensusError::AssetLockOutPointAlreadyUsed(
            out_point.to_bytes().to_vec(),
        )));
    }

    if !repository.verify_instant_lock(&instant_lock).await? {
        return Ok(Err(ConsensusError::InvalidInstantAssetLockSignature));
    }

    Ok(public_key_hash(&payload).map(|public_key_hash| LockedOutput {
        out_point,
        value,
        public_key_hash,
    }))
}

async fn verify_chain(
    proof: &ChainAssetLockProof,
    repository: &dyn StateRepository,
    config: &PlatformConfig,
) -> Result<Result<LockedOutput, ConsensusError>, PlatformError> {
    let platform_height = repository
        .fetch_latest_platform_core_chain_locked_height()
        .await?;
    if proof.core_chain_locked_height > platform_height {
        return Ok(Err(ConsensusError::InvalidAssetLockProofCoreChainHeight {
            proof_height: proof.core_chain_locked_height,
            platform_height,
        }));
    }

    let out_point = proof.out_point;
    let Some(fetched) = repository.fetch_transaction(&out_point.txid).await? else {
        return Ok(Err(ConsensusError::AssetLockTransactionNotFound(
            out_point.txid,
        )));
    };
    let finalized = fetched.is_chain_locked
        || (config.allow_unlocked_confirmed_asset_locks && fetched.confirmations >= 1);
    if !finalized {
        return Ok(Err(ConsensusError::AssetLockTransactionNotFinalized(
            out_point.txid,
        )));
    }

    let (value, payload) = match locked_output(&fetched.data, out_point) {
        Ok(found) => found,
        Err(error) => return Ok(Err(error)),
    };

    if repository
        .is_asset_lock_transaction_out_point_already_used(&out_point)
        .await?
    {
        return Ok(Err(ConsensusError::AssetLockOutPointAlreadyUsed(
            out_point.to_bytes().to_vec(),
        )));
    }

    Ok(public_key_hash(&payload).map(|public_key_hash| LockedOutput {
        out_point,
        value,
        public_key_hash,
    }))
}

/// Re-read the funding output of an already verified proof.
///
/// Used when applying; any failure means state moved underneath us.
pub async fn resolve_locked_output(
    proof: &AssetLockProof,
    repository: &dyn StateRepository,
) -> Result<LockedOutput, PlatformError> {
    let out_point = proof.out_point();
    let raw_transaction = match proof {
        AssetLockProof::Instant(proof) => proof.transaction.clone(),
        AssetLockProof::Chain(proof) => repository
            .fetch_transaction(&proof.out_point.txid)
            .await?
            .map(|fetched| fetched.data)
            .ok_or_else(|| {
                PlatformError::StateConflict(format!(
                    "asset lock transaction {} disappeared",
                    hex::encode(out_point.txid)
                ))
            })?,
    };
    let (value, payload) = locked_output(&raw_transaction, out_point)
        .map_err(|e| PlatformError::StateConflict(e.to_string()))?;
    let public_key_hash =
        public_key_hash(&payload).map_err(|e| PlatformError::StateConflict(e.to_string()))?;
    Ok(LockedOutput {
        out_point,
        value,
        public_key_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStateRepository;
    use crate::domain::{transaction_id, FetchedTransaction, TxOut};
    use crate::test_utils::{asset_lock_transaction, instant_asset_lock_proof, instant_lock_for};

    const KEY_HASH: PublicKeyHash = [0x5A; 20];

    fn chain_proof(repository: &InMemoryStateRepository, chain_locked: bool, confirmations: u32) -> AssetLockProof {
        let raw = asset_lock_transaction(KEY_HASH, 2_000, 9).to_bytes().unwrap();
        let txid = transaction_id(&raw);
        repository.add_transaction(
            txid,
            FetchedTransaction {
                data: raw,
                height: Some(5),
                confirmations,
                is_chain_locked: chain_locked,
            },
        );
        AssetLockProof::Chain(ChainAssetLockProof {
            core_chain_locked_height: 5,
            out_point: OutPoint::new(txid, 0),
        })
    }

    #[tokio::test]
    async fn test_instant_proof_yields_locked_output() {
        let repository = InMemoryStateRepository::new();
        let proof = AssetLockProof::Instant(instant_asset_lock_proof(KEY_HASH, 1_500, 1));
        let result = verify_asset_lock_proof(&proof, &repository, &PlatformConfig::default())
            .await
            .unwrap();
        assert!(result.is_valid());
        let locked = result.into_data().unwrap();
        assert_eq!(locked.value, 1_500);
        assert_eq!(locked.public_key_hash, KEY_HASH);
        assert_eq!(locked.out_point, proof.out_point());
    }

    #[tokio::test]
    async fn test_used_out_point_rejected() {
        let repository = InMemoryStateRepository::new();
        let proof = AssetLockProof::Instant(instant_asset_lock_proof(KEY_HASH, 1_500, 1));
        repository
            .mark_asset_lock_transaction_out_point_as_used(&proof.out_point())
            .await
            .unwrap();
        let result = verify_asset_lock_proof(&proof, &repository, &PlatformConfig::default())
            .await
            .unwrap();
        assert_eq!(
            result.errors(),
            &[ConsensusError::AssetLockOutPointAlreadyUsed(
                proof.out_point().to_bytes().to_vec()
            )]
        );
    }

    #[tokio::test]
    async fn test_instant_lock_for_other_transaction_rejected() {
        let repository = InMemoryStateRepository::new();
        let mut proof = instant_asset_lock_proof(KEY_HASH, 1_500, 1);
        let other = asset_lock_transaction(KEY_HASH, 1_500, 2);
        proof.instant_lock = instant_lock_for(&other).to_bytes().unwrap();
        let result = verify_asset_lock_proof(
            &AssetLockProof::Instant(proof),
            &repository,
            &PlatformConfig::default(),
        )
        .await
        .unwrap();
        assert!(matches!(
            result.errors(),
            [ConsensusError::InstantLockTransactionIdMismatch { .. }]
        ));
    }

    #[tokio::test]
    async fn test_bad_signature_and_output_checks() {
        let repository = InMemoryStateRepository::new();
        repository.set_instant_locks_valid(false);
        let proof = AssetLockProof::Instant(instant_asset_lock_proof(KEY_HASH, 1_500, 1));
        let result = verify_asset_lock_proof(&proof, &repository, &PlatformConfig::default())
            .await
            .unwrap();
        assert_eq!(
            result.errors(),
            &[ConsensusError::InvalidInstantAssetLockSignature]
        );

        let mut out_of_range = instant_asset_lock_proof(KEY_HASH, 1_500, 1);
        out_of_range.output_index = 3;
        let result = verify_asset_lock_proof(
            &AssetLockProof::Instant(out_of_range),
            &repository,
            &PlatformConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            result.errors(),
            &[ConsensusError::InvalidAssetLockOutputIndex {
                index: 3,
                outputs: 1
            }]
        );
    }

    #[tokio::test]
    async fn test_short_key_hash_rejected() {
        let repository = InMemoryStateRepository::new();
        let mut transaction = asset_lock_transaction(KEY_HASH, 1_500, 1);
        transaction.outputs[0] = TxOut::data_carrier(1_500, &[1; 19]);
        let proof = InstantAssetLockProof {
            transaction: transaction.to_bytes().unwrap(),
            output_index: 0,
            instant_lock: instant_lock_for(&transaction).to_bytes().unwrap(),
        };
        let result = verify_asset_lock_proof(
            &AssetLockProof::Instant(proof),
            &repository,
            &PlatformConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            result.errors(),
            &[ConsensusError::InvalidAssetLockPublicKeyHashLength(19)]
        );
    }

    #[tokio::test]
    async fn test_chain_proof_requires_chain_lock_unless_opted_in() {
        let repository = InMemoryStateRepository::new();
        repository.set_core_chain_locked_height(10);
        let proof = chain_proof(&repository, false, 3);

        let mut config = PlatformConfig::default();
        let result = verify_asset_lock_proof(&proof, &repository, &config)
            .await
            .unwrap();
        assert!(matches!(
            result.errors(),
            [ConsensusError::AssetLockTransactionNotFinalized(_)]
        ));

        config.allow_unlocked_confirmed_asset_locks = true;
        let result = verify_asset_lock_proof(&proof, &repository, &config)
            .await
            .unwrap();
        assert!(result.is_valid());
        assert_eq!(result.data().unwrap().value, 2_000);
    }

    #[tokio::test]
    async fn test_chain_proof_height_and_lookup() {
        let repository = InMemoryStateRepository::new();
        repository.set_core_chain_locked_height(4);
        let proof = chain_proof(&repository, true, 1);
        let result = verify_asset_lock_proof(&proof, &repository, &PlatformConfig::default())
            .await
            .unwrap();
        assert_eq!(
            result.errors(),
            &[ConsensusError::InvalidAssetLockProofCoreChainHeight {
                proof_height: 5,
                platform_height: 4
            }]
        );

        repository.set_core_chain_locked_height(5);
        let unknown = AssetLockProof::Chain(ChainAssetLockProof {
            core_chain_locked_height: 5,
            out_point: OutPoint::new([0xAA; 32], 0),
        });
        let result = verify_asset_lock_proof(&unknown, &repository, &PlatformConfig::default())
            .await
            .unwrap();
        assert_eq!(
            result.errors(),
            &[ConsensusError::AssetLockTransactionNotFound([0xAA; 32])]
        );
    }

    #[tokio::test]
    async fn test_resolve_locked_output_for_apply() {
        let repository = InMemoryStateRepository::new();
        let proof = AssetLockProof::Instant(instant_asset_lock_proof(KEY_HASH, 700, 4));
        let locked = resolve_locked_output(&proof, &repository).await.unwrap();
        assert_eq!(locked.value, 700);

        let missing = AssetLockProof::Chain(ChainAssetLockProof {
            core_chain_locked_height: 1,
            out_point: OutPoint::new([0xAB; 32], 0),
        });
        assert!(matches!(
            resolve_locked_output(&missing, &repository).await,
            Err(PlatformError::StateConflict(_))
        ));
    }
}
