//! # Apply
//!
//! Turns a validated transition into repository mutations. Every target is
//! re-checked first; a mismatch means state moved since validation and is
//! reported as [`PlatformError::StateConflict`].
//!
//! | Transition | Mutations |
//! |------------|-----------|
//! | DataContractCreate | store contract |
//! | DocumentsBatch | store / replace / remove each document in order |
//! | IdentityCreate | store identity, store key hashes, mark outpoint used |
//! | IdentityTopUp | credit balance, mark outpoint used |

use crate::domain::{
    convert_duffs_to_credits, AssetLockProof, DataContractCreateTransition, Document,
    DocumentTransition, DocumentsBatchTransition, Identity, IdentityCreateTransition,
    IdentityTopUpTransition, LockedOutput, PlatformError, StateTransition,
};
use crate::ports::outbound::{DocumentQuery, StateRepository};
use crate::validation::resolve_locked_output;
use shared_types::Identifier;
use tracing::info;

/// Apply a validated transition.
pub async fn apply_state_transition(
    transition: &StateTransition,
    repository: &dyn StateRepository,
) -> Result<(), PlatformError> {
    match transition {
        StateTransition::DataContractCreate(st) => apply_data_contract_create(st, repository).await,
        StateTransition::DocumentsBatch(st) => apply_documents_batch(st, repository).await,
        StateTransition::IdentityCreate(st) => apply_identity_create(st, repository).await,
        StateTransition::IdentityTopUp(st) => apply_identity_top_up(st, repository).await,
    }
}

async fn apply_data_contract_create(
    transition: &DataContractCreateTransition,
    repository: &dyn StateRepository,
) -> Result<(), PlatformError> {
    let contract = &transition.data_contract;
    if repository.fetch_data_contract(&contract.id).await?.is_some() {
        return Err(PlatformError::StateConflict(format!(
            "data contract {} already exists",
            contract.id
        )));
    }
    repository.store_data_contract(contract.clone()).await?;
    info!(contract_id = %contract.id, owner_id = %contract.owner_id, "Data contract created");
    Ok(())
}

async fn fetch_document(
    repository: &dyn StateRepository,
    contract_id: &Identifier,
    document_type: &str,
    id: &Identifier,
) -> Result<Option<Document>, PlatformError> {
    let query = DocumentQuery::all().where_eq("$id", id.to_value());
    Ok(repository
        .fetch_documents(contract_id, document_type, &query)
        .await?
        .into_iter()
        .next())
}

async fn apply_documents_batch(
    batch: &DocumentsBatchTransition,
    repository: &dyn StateRepository,
) -> Result<(), PlatformError> {
    for transition in &batch.transitions {
        let contract_id = transition.data_contract_id();
        let document_type = transition.document_type();
        let existing =
            fetch_document(repository, &contract_id, document_type, &transition.id()).await?;

        match (transition, existing) {
            (DocumentTransition::Create(create), None) => {
                repository
                    .store_document(create.to_document(batch.owner_id, batch.protocol_version))
                    .await?;
            }
            (DocumentTransition::Replace(replace), Some(existing)) => {
                repository.store_document(replace.to_document(&existing)).await?;
            }
            (DocumentTransition::Delete(delete), Some(_)) => {
                repository
                    .remove_document(&contract_id, document_type, &delete.id)
                    .await?;
            }
            (transition, existing) => {
                return Err(PlatformError::StateConflict(format!(
                    "cannot {} document {}: it {}",
                    transition.action().name(),
                    transition.id(),
                    if existing.is_some() { "exists" } else { "does not exist" }
                )));
            }
        }
    }
    info!(
        owner_id = %batch.owner_id,
        transitions = batch.transitions.len(),
        "Documents batch applied"
    );
    Ok(())
}

/// Resolve the funding output and make sure it is still unspent.
async fn consume_asset_lock(
    proof: &AssetLockProof,
    repository: &dyn StateRepository,
) -> Result<LockedOutput, PlatformError> {
    let locked = resolve_locked_output(proof, repository).await?;
    if repository
        .is_asset_lock_transaction_out_point_already_used(&locked.out_point)
        .await?
    {
        return Err(PlatformError::StateConflict(format!(
            "asset lock outpoint {} already used",
            hex::encode(locked.out_point.to_bytes())
        )));
    }
    Ok(locked)
}

async fn apply_identity_create(
    transition: &IdentityCreateTransition,
    repository: &dyn StateRepository,
) -> Result<(), PlatformError> {
    let identity_id = transition.identity_id();
    if repository.fetch_identity(&identity_id).await?.is_some() {
        return Err(PlatformError::StateConflict(format!(
            "identity {identity_id} already exists"
        )));
    }
    let locked = consume_asset_lock(&transition.asset_lock_proof, repository).await?;

    let identity = Identity::new(
        transition.protocol_version,
        identity_id,
        transition.public_keys.clone(),
        convert_duffs_to_credits(locked.value),
    );
    let hashes = identity.public_key_hashes();
    let balance = identity.balance;

    repository.store_identity(identity).await?;
    repository
        .store_identity_public_key_hashes(&identity_id, &hashes)
        .await?;
    repository
        .mark_asset_lock_transaction_out_point_as_used(&locked.out_point)
        .await?;
    info!(identity_id = %identity_id, balance, "Identity created");
    Ok(())
}

async fn apply_identity_top_up(
    transition: &IdentityTopUpTransition,
    repository: &dyn StateRepository,
) -> Result<(), PlatformError> {
    let Some(mut identity) = repository.fetch_identity(&transition.identity_id).await? else {
        return Err(PlatformError::StateConflict(format!(
            "identity {} does not exist",
            transition.identity_id
        )));
    };
    let locked = consume_asset_lock(&transition.asset_lock_proof, repository).await?;

    identity.credit(convert_duffs_to_credits(locked.value));
    let balance = identity.balance;
    repository.store_identity(identity).await?;
    repository
        .mark_asset_lock_transaction_out_point_as_used(&locked.out_point)
        .await?;
    info!(identity_id = %transition.identity_id, balance, "Identity topped up");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStateRepository;
    use crate::domain::{DocumentCreateTransition, DocumentDeleteTransition};
    use crate::test_utils::{identity_create_transition, instant_asset_lock_proof, note_contract};
    use serde_json::json;

    #[tokio::test]
    async fn test_contract_create_conflicts_on_second_apply() {
        let repository = InMemoryStateRepository::new();
        let transition = StateTransition::DataContractCreate(DataContractCreateTransition::new(
            1,
            Identifier::new([1; 32]),
            crate::test_utils::note_documents(),
            0,
        ));
        apply_state_transition(&transition, &repository).await.unwrap();
        assert!(matches!(
            apply_state_transition(&transition, &repository).await,
            Err(PlatformError::StateConflict(_))
        ));
    }

    #[tokio::test]
    async fn test_identity_create_then_top_up_credits_balance() {
        let repository = InMemoryStateRepository::new();
        let create = identity_create_transition(1, 1_000, 1);
        let identity_id = create.identity_id();
        let key_hash = create.public_keys[0].hash().unwrap();
        apply_state_transition(&StateTransition::IdentityCreate(create.clone()), &repository)
            .await
            .unwrap();

        let identity = repository.fetch_identity(&identity_id).await.unwrap().unwrap();
        assert_eq!(identity.balance, 1_000_000);
        assert_eq!(
            repository
                .fetch_identity_ids_by_public_key_hashes(&[key_hash])
                .await
                .unwrap()
                .get(&key_hash),
            Some(&identity_id)
        );
        assert!(repository
            .is_asset_lock_transaction_out_point_already_used(&create.asset_lock_proof.out_point())
            .await
            .unwrap());

        let top_up = IdentityTopUpTransition {
            protocol_version: 1,
            asset_lock_proof: AssetLockProof::Instant(instant_asset_lock_proof([2; 20], 250, 2)),
            identity_id,
            signature: vec![],
        };
        apply_state_transition(&StateTransition::IdentityTopUp(top_up.clone()), &repository)
            .await
            .unwrap();
        let identity = repository.fetch_identity(&identity_id).await.unwrap().unwrap();
        assert_eq!(identity.balance, 1_250_000);

        assert!(matches!(
            apply_state_transition(&StateTransition::IdentityTopUp(top_up), &repository).await,
            Err(PlatformError::StateConflict(_))
        ));
    }

    #[tokio::test]
    async fn test_documents_batch_create_then_delete() {
        let repository = InMemoryStateRepository::new();
        let owner = Identifier::new([1; 32]);
        let contract = note_contract(owner);
        let create = DocumentCreateTransition::new(
            &contract,
            &owner,
            "note",
            [2; 32],
            json!({ "message": "hi" }).as_object().cloned().unwrap_or_default(),
        );
        let id = create.id;
        let batch = DocumentsBatchTransition::new(1, owner, vec![DocumentTransition::Create(create)], 0);
        apply_state_transition(&StateTransition::DocumentsBatch(batch), &repository)
            .await
            .unwrap();
        assert_eq!(repository.document_count(&contract.id, "note"), 1);

        let delete = DocumentsBatchTransition::new(
            1,
            owner,
            vec![DocumentTransition::Delete(DocumentDeleteTransition {
                id,
                document_type: "note".into(),
                data_contract_id: contract.id,
            })],
            0,
        );
        let delete = StateTransition::DocumentsBatch(delete);
        apply_state_transition(&delete, &repository).await.unwrap();
        assert_eq!(repository.document_count(&contract.id, "note"), 0);
        assert!(matches!(
            apply_state_transition(&delete, &repository).await,
            Err(PlatformError::StateConflict(_))
        ));
    }
}
