//! Name service registrations through the system contract triggers.

use super::support::service_with;
use qc_18_platform_state::test_utils::dpns_contract;
use qc_18_platform_state::triggers::dpns::{salted_domain_hash, DOMAIN, PREORDER};
use qc_18_platform_state::{
    ConsensusError, DataContract, DocumentCreateTransition, DocumentDeleteTransition,
    DocumentTransition, DocumentsBatchTransition, InMemoryStateRepository, PlatformConfig,
    PlatformStateApi, PlatformStateService, ProcessOutcome, ProcessingStage, StateRepository,
    StateTransition, SystemContractBinding,
};
use serde_json::{json, Map, Value};
use shared_types::Identifier;
use std::sync::Arc;

const SALT: [u8; 32] = [0x5A; 32];

fn system() -> Identifier {
    Identifier::new([0x51; 32])
}

fn alice() -> Identifier {
    Identifier::new([0xA1; 32])
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

struct NameService {
    service: PlatformStateService<InMemoryStateRepository>,
    repository: Arc<InMemoryStateRepository>,
    contract: DataContract,
}

impl NameService {
    async fn start() -> Self {
        let contract = dpns_contract(system());
        let config = PlatformConfig {
            dpns: Some(SystemContractBinding {
                contract_id: contract.id,
                system_identity_id: system(),
            }),
            ..PlatformConfig::default()
        };
        let (service, repository) = service_with(config).await;
        repository.store_data_contract(contract.clone()).await.unwrap();
        Self {
            service,
            repository,
            contract,
        }
    }

    async fn submit(&self, owner: Identifier, transitions: Vec<DocumentTransition>) -> ProcessOutcome {
        let batch = DocumentsBatchTransition::new(1, owner, transitions, 0);
        self.service
            .process(&StateTransition::DocumentsBatch(batch).to_object().unwrap())
            .await
            .unwrap()
    }

    fn preorder(&self, owner: Identifier, full_name: &str, seed: u8) -> DocumentTransition {
        let hash = salted_domain_hash(&SALT, full_name);
        DocumentTransition::Create(DocumentCreateTransition::new(
            &self.contract,
            &owner,
            PREORDER,
            [seed; 32],
            object(json!({ "saltedDomainHash": hash.to_vec() })),
        ))
    }

    fn domain(&self, owner: Identifier, label: &str, parent: &str, open: bool, seed: u8) -> DocumentCreateTransition {
        DocumentCreateTransition::new(
            &self.contract,
            &owner,
            DOMAIN,
            [seed; 32],
            object(json!({
                "label": label,
                "normalizedLabel": label.to_lowercase(),
                "normalizedParentDomainName": parent,
                "preorderSalt": SALT.to_vec(),
                "records": { "dashUniqueIdentityId": owner.to_value() },
                "subdomainRules": { "allowSubdomains": open }
            })),
        )
    }
}

fn trigger_messages(outcome: &ProcessOutcome) -> Vec<String> {
    outcome
        .errors()
        .iter()
        .map(|error| match error {
            ConsensusError::DataTriggerCondition { message, .. } => message.clone(),
            other => panic!("unexpected {other:?}"),
        })
        .collect()
}

#[tokio::test]
async fn test_subdomain_registration_flow() {
    let dpns = NameService::start().await;

    let early = dpns.domain(alice(), "alice", "dash", false, 10);
    let outcome = dpns.submit(alice(), vec![DocumentTransition::Create(early)]).await;
    assert!(matches!(
        outcome,
        ProcessOutcome::Rejected {
            stage: ProcessingStage::DataTriggers,
            ..
        }
    ));
    assert_eq!(
        trigger_messages(&outcome),
        vec!["Parent domain is not present", "preorderDocument was not found"]
    );

    let outcome = dpns.submit(system(), vec![dpns.preorder(system(), "dash", 1)]).await;
    assert!(outcome.is_applied(), "{:?}", outcome.errors());
    let tld = dpns.domain(system(), "Dash", "", true, 2);
    let outcome = dpns.submit(system(), vec![DocumentTransition::Create(tld)]).await;
    assert!(outcome.is_applied(), "{:?}", outcome.errors());

    let outcome = dpns.submit(alice(), vec![dpns.preorder(alice(), "alice.dash", 3)]).await;
    assert!(outcome.is_applied(), "{:?}", outcome.errors());
    let subdomain = dpns.domain(alice(), "Alice", "dash", false, 4);
    let outcome = dpns.submit(alice(), vec![DocumentTransition::Create(subdomain)]).await;
    assert!(outcome.is_applied(), "{:?}", outcome.errors());

    assert_eq!(dpns.repository.document_count(&dpns.contract.id, DOMAIN), 2);
    assert_eq!(dpns.repository.document_count(&dpns.contract.id, PREORDER), 2);
}

#[tokio::test]
async fn test_top_level_domain_reserved_for_system_identity() {
    let dpns = NameService::start().await;
    let outcome = dpns.submit(alice(), vec![dpns.preorder(alice(), "evil", 1)]).await;
    assert!(outcome.is_applied());

    let tld = dpns.domain(alice(), "evil", "", true, 2);
    let outcome = dpns.submit(alice(), vec![DocumentTransition::Create(tld)]).await;
    assert_eq!(
        trigger_messages(&outcome),
        vec!["Can't create top level domain for this identity"]
    );
    assert_eq!(outcome.error_codes(), vec![4030]);
}

#[tokio::test]
async fn test_domains_cannot_be_deleted() {
    let dpns = NameService::start().await;
    assert!(dpns
        .submit(system(), vec![dpns.preorder(system(), "dash", 1)])
        .await
        .is_applied());
    let tld = dpns.domain(system(), "dash", "", true, 2);
    let id = tld.id;
    assert!(dpns
        .submit(system(), vec![DocumentTransition::Create(tld)])
        .await
        .is_applied());

    let delete = DocumentTransition::Delete(DocumentDeleteTransition {
        id,
        document_type: DOMAIN.into(),
        data_contract_id: dpns.contract.id,
    });
    let outcome = dpns.submit(system(), vec![delete]).await;
    assert_eq!(trigger_messages(&outcome), vec!["Action delete is not allowed"]);
    assert_eq!(dpns.repository.document_count(&dpns.contract.id, DOMAIN), 1);
}
