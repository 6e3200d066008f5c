//! Identity registration and top-ups funded by asset locks.

use super::support::service;
use qc_18_platform_state::test_utils::{identity_create_transition, instant_asset_lock_proof};
use qc_18_platform_state::{
    AssetLockProof, ConsensusError, IdentityTopUpTransition, PlatformStateApi, ProcessOutcome,
    ProcessingStage, StateRepository, StateTransition,
};
use serde_json::Value;

#[tokio::test]
async fn test_identity_create_then_outpoint_reuse_rejected() {
    let (service, repository) = service().await;
    let create = identity_create_transition(1, 5_000, 1);
    let identity_id = create.identity_id();
    let out_point = create.asset_lock_proof.out_point();

    let outcome = service
        .process(&StateTransition::IdentityCreate(create.clone()).to_object().unwrap())
        .await
        .unwrap();
    assert!(outcome.is_applied(), "{:?}", outcome.errors());

    let identity = repository.fetch_identity(&identity_id).await.unwrap().unwrap();
    assert_eq!(identity.balance, 5_000_000);
    assert!(repository
        .is_asset_lock_transaction_out_point_already_used(&out_point)
        .await
        .unwrap());

    // Same funding output, different key set.
    let mut replay = identity_create_transition(2, 5_000, 1);
    replay.asset_lock_proof = create.asset_lock_proof.clone();
    let outcome = service
        .process(&StateTransition::IdentityCreate(replay).to_object().unwrap())
        .await
        .unwrap();
    let ProcessOutcome::Rejected { stage, errors } = outcome else {
        panic!("reused outpoint must be rejected");
    };
    assert_eq!(stage, ProcessingStage::State);
    assert!(matches!(
        errors.first(),
        Some(ConsensusError::AssetLockOutPointAlreadyUsed(_))
    ));
}

#[tokio::test]
async fn test_top_up_credits_existing_identity() {
    let (service, repository) = service().await;
    let create = identity_create_transition(3, 1_000, 3);
    let identity_id = create.identity_id();
    assert!(service
        .process(&StateTransition::IdentityCreate(create).to_object().unwrap())
        .await
        .unwrap()
        .is_applied());

    let top_up = StateTransition::IdentityTopUp(IdentityTopUpTransition {
        protocol_version: 1,
        asset_lock_proof: AssetLockProof::Instant(instant_asset_lock_proof([0x77; 20], 400, 4)),
        identity_id,
        signature: vec![],
    });
    let wire = top_up.to_object().unwrap();
    assert!(service.process(&wire).await.unwrap().is_applied());

    let identity = repository.fetch_identity(&identity_id).await.unwrap().unwrap();
    assert_eq!(identity.balance, 1_400_000);

    let replay = service.process(&wire).await.unwrap();
    assert_eq!(replay.error_codes(), vec![1047]);
}

#[tokio::test]
async fn test_unknown_proof_type_never_fetches_transactions() {
    let (service, repository) = service().await;
    let mut wire = StateTransition::IdentityCreate(identity_create_transition(4, 1_000, 5))
        .to_object()
        .unwrap();
    wire["assetLockProof"]["type"] = Value::from(7);

    let outcome = service.process(&wire).await.unwrap();
    assert_eq!(
        outcome,
        ProcessOutcome::Rejected {
            stage: ProcessingStage::Basic,
            errors: vec![ConsensusError::UnknownAssetLockProofType(Some(7))],
        }
    );
    assert_eq!(repository.transaction_fetch_count(), 0);
    assert_eq!(service.stats().rejected_basic, 1);
}

#[tokio::test]
async fn test_top_up_of_unknown_identity_rejected() {
    let (service, _repository) = service().await;
    let missing = identity_create_transition(5, 1_000, 6).identity_id();
    let wire = StateTransition::IdentityTopUp(IdentityTopUpTransition {
        protocol_version: 1,
        asset_lock_proof: AssetLockProof::Instant(instant_asset_lock_proof([0x78; 20], 100, 7)),
        identity_id: missing,
        signature: vec![],
    })
    .to_object()
    .unwrap();

    let outcome = service.process(&wire).await.unwrap();
    assert_eq!(
        outcome.errors(),
        &[ConsensusError::IdentityNotFound(missing)]
    );
}
