//! Data contract registration and document batches.

use super::support::service;
use qc_18_platform_state::test_utils::note_documents;
use qc_18_platform_state::{
    ConsensusError, DataContract, DataContractCreateTransition, DocumentCreateTransition,
    DocumentQuery, DocumentReplaceTransition, DocumentTransition, DocumentsBatchTransition,
    InMemoryStateRepository, PlatformStateApi, PlatformStateService, ProcessOutcome,
    ProcessingStage, StateRepository, StateTransition,
};
use serde_json::{json, Map, Value};
use shared_types::Identifier;

fn owner() -> Identifier {
    Identifier::new([0x0A; 32])
}

fn data(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn raw(transition: StateTransition) -> Value {
    transition.to_object().unwrap()
}

fn batch(owner_id: Identifier, transitions: Vec<DocumentTransition>) -> Value {
    raw(StateTransition::DocumentsBatch(DocumentsBatchTransition::new(
        1,
        owner_id,
        transitions,
        0,
    )))
}

async fn register_contract(service: &PlatformStateService<InMemoryStateRepository>) -> DataContract {
    let transition = DataContractCreateTransition::new(1, owner(), note_documents(), 0);
    let contract = transition.data_contract.clone();
    let outcome = service
        .process(&raw(StateTransition::DataContractCreate(transition)))
        .await
        .unwrap();
    assert!(outcome.is_applied(), "{:?}", outcome.errors());
    contract
}

#[tokio::test]
async fn test_contract_create_end_to_end_and_resubmit() {
    let (service, repository) = service().await;
    let transition = DataContractCreateTransition::new(1, owner(), note_documents(), 0);
    let contract_id = transition.data_contract.id;
    let wire = raw(StateTransition::DataContractCreate(transition));

    assert!(service.process(&wire).await.unwrap().is_applied());
    let stored = repository.fetch_data_contract(&contract_id).await.unwrap();
    assert_eq!(stored.map(|contract| contract.owner_id), Some(owner()));

    let again = service.process(&wire).await.unwrap();
    assert_eq!(
        again,
        ProcessOutcome::Rejected {
            stage: ProcessingStage::State,
            errors: vec![ConsensusError::DataContractAlreadyPresent(contract_id)],
        }
    );
}

#[tokio::test]
async fn test_catastrophic_pattern_rejected_before_state() {
    let (service, repository) = service().await;
    let documents = data(json!({
        "word": {
            "type": "object",
            "properties": { "bad": { "type": "string", "pattern": "(a+)+$" } },
            "additionalProperties": false
        }
    }));
    let transition = DataContractCreateTransition::new(1, owner(), documents, 0);
    let contract_id = transition.data_contract.id;

    let outcome = service
        .process(&raw(StateTransition::DataContractCreate(transition)))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        ProcessOutcome::Rejected {
            stage: ProcessingStage::Basic,
            ..
        }
    ));
    assert_eq!(outcome.error_codes(), vec![1012]);
    assert!(repository
        .fetch_data_contract(&contract_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_three_document_batch_with_unique_collision() {
    let (service, repository) = service().await;
    let contract = register_contract(&service).await;

    let alice = DocumentCreateTransition::new(&contract, &owner(), "profile", [1; 32], data(json!({ "handle": "alice" })));
    let twin = DocumentCreateTransition::new(&contract, &owner(), "profile", [2; 32], data(json!({ "handle": "alice" })));
    let bob = DocumentCreateTransition::new(&contract, &owner(), "profile", [3; 32], data(json!({ "handle": "bob" })));

    let outcome = service
        .process(&batch(
            owner(),
            vec![
                DocumentTransition::Create(alice.clone()),
                DocumentTransition::Create(twin.clone()),
                DocumentTransition::Create(bob.clone()),
            ],
        ))
        .await
        .unwrap();

    let ProcessOutcome::Rejected { stage, errors } = outcome else {
        panic!("collision must reject the batch");
    };
    assert_eq!(stage, ProcessingStage::State);
    let colliding: Vec<Identifier> = errors
        .iter()
        .map(|error| match error {
            ConsensusError::DuplicateUniqueIndex { document_id, .. } => *document_id,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(colliding, vec![alice.id, twin.id]);
    assert_eq!(repository.document_count(&contract.id, "profile"), 0);

    let outcome = service
        .process(&batch(
            owner(),
            vec![
                DocumentTransition::Create(alice),
                DocumentTransition::Create(bob),
            ],
        ))
        .await
        .unwrap();
    assert!(outcome.is_applied(), "{:?}", outcome.errors());
    assert_eq!(repository.document_count(&contract.id, "profile"), 2);
}

#[tokio::test]
async fn test_replace_checks_revision_and_owner() {
    let (service, repository) = service().await;
    let contract = register_contract(&service).await;

    let note = DocumentCreateTransition::new(&contract, &owner(), "note", [5; 32], data(json!({ "message": "v1" })));
    let created = service
        .process(&batch(owner(), vec![DocumentTransition::Create(note.clone())]))
        .await
        .unwrap();
    assert!(created.is_applied(), "{:?}", created.errors());

    let replace = DocumentReplaceTransition {
        id: note.id,
        document_type: "note".into(),
        data_contract_id: contract.id,
        revision: 3,
        created_at: None,
        updated_at: None,
        data: data(json!({ "message": "v2" })),
    };

    let stranger = Identifier::new([0x0B; 32]);
    let outcome = service
        .process(&batch(stranger, vec![DocumentTransition::Replace(replace.clone())]))
        .await
        .unwrap();
    assert_eq!(outcome.error_codes(), vec![4006, 4007]);

    let outcome = service
        .process(&batch(owner(), vec![DocumentTransition::Replace(replace.clone())]))
        .await
        .unwrap();
    assert_eq!(outcome.error_codes(), vec![4007]);

    let next = DocumentReplaceTransition { revision: 2, ..replace };
    let outcome = service
        .process(&batch(owner(), vec![DocumentTransition::Replace(next)]))
        .await
        .unwrap();
    assert!(outcome.is_applied(), "{:?}", outcome.errors());

    let stored = repository
        .fetch_documents(
            &contract.id,
            "note",
            &DocumentQuery::all().where_eq("$id", note.id.to_value()),
        )
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].revision, 2);
    assert_eq!(stored[0].data.get("message"), Some(&json!("v2")));
}
