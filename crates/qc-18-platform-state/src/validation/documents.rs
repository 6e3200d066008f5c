//! # Documents Batch Validation
//!
//! Basic checks inspect the raw batch: size, actions, per-action shape,
//! duplicate targets and create ids. State checks evaluate every
//! sub-transition independently against stored documents and merge the
//! errors, then look for unique index collisions across the whole batch.

use super::basic::{check_protocol_version, BasicContext};
use super::pipeline::ValidationPipeline;
use crate::config::PlatformConfig;
use crate::domain::transitions::wire::value_to_bytes;
use crate::domain::{
    generate_document_id, ConsensusError, DataContract, Document, DocumentAction,
    DocumentCreateTransition, DocumentDeleteTransition, DocumentReplaceTransition,
    DocumentTransition, DocumentsBatchTransition, PlatformError, ValidationResult,
};
use crate::ports::outbound::{DocumentQuery, SchemaValidator, StateRepository};
use crate::schema::SchemaKind;
use serde_json::Value;
use shared_types::Identifier;
use std::collections::{HashMap, HashSet};
use tracing::debug;

// =============================================================================
// BASIC
// =============================================================================

pub(crate) fn basic_pipeline<'a>() -> ValidationPipeline<BasicContext<'a>> {
    ValidationPipeline::new()
        .halt_on_failure("documents_batch_schema", check_batch_schema)
        .halt_on_failure("protocol_version", check_protocol_version)
        .halt_on_failure("max_transitions", check_max_transitions)
        .halt_on_failure("transition_actions", check_actions)
        .halt_on_failure("transition_schemas", check_transition_schemas)
        .continue_on_failure("duplicate_transitions", check_duplicates)
        .continue_on_failure("create_ids", check_create_ids)
}

fn raw_transitions<'v>(context: &'v BasicContext<'_>) -> &'v [Value] {
    context.raw["transitions"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn raw_action(transition: &Value) -> Option<u64> {
    transition.get("$action").and_then(Value::as_u64)
}

fn check_batch_schema(context: &BasicContext<'_>) -> ValidationResult {
    context
        .schemas
        .validate_static(SchemaKind::DocumentsBatch, context.raw)
}

fn check_max_transitions(context: &BasicContext<'_>) -> ValidationResult {
    let count = raw_transitions(context).len();
    let max = context.config.max_document_transitions;
    if count > max {
        ValidationResult::with_error(ConsensusError::MaxDocumentsTransitionsExceeded { count, max })
    } else {
        ValidationResult::new()
    }
}

fn check_actions(context: &BasicContext<'_>) -> ValidationResult {
    let errors = raw_transitions(context)
        .iter()
        .filter_map(|transition| {
            let action = raw_action(transition);
            match action.map(DocumentAction::try_from) {
                Some(Ok(_)) => None,
                Some(Err(unknown)) => {
                    Some(ConsensusError::InvalidDocumentTransitionAction(Some(unknown)))
                }
                None => Some(ConsensusError::InvalidDocumentTransitionAction(None)),
            }
        })
        .collect();
    ValidationResult::with_errors(errors)
}

fn check_transition_schemas(context: &BasicContext<'_>) -> ValidationResult {
    let mut result = ValidationResult::new();
    for transition in raw_transitions(context) {
        let kind = match raw_action(transition).map(DocumentAction::try_from) {
            Some(Ok(DocumentAction::Create)) => SchemaKind::DocumentCreate,
            Some(Ok(DocumentAction::Replace)) => SchemaKind::DocumentReplace,
            Some(Ok(DocumentAction::Delete)) => SchemaKind::DocumentDelete,
            _ => continue,
        };
        result.merge(context.schemas.validate_static(kind, transition));
    }
    result
}

fn check_duplicates(context: &BasicContext<'_>) -> ValidationResult {
    let mut seen = HashSet::new();
    let mut references: Vec<(String, Identifier)> = Vec::new();
    for transition in raw_transitions(context) {
        let (Some(document_type), Ok(id)) = (
            transition["$type"].as_str(),
            Identifier::from_value(&transition["$id"]),
        ) else {
            continue;
        };
        let reference = (document_type.to_string(), id);
        if !seen.insert(reference.clone()) && !references.contains(&reference) {
            references.push(reference);
        }
    }
    if references.is_empty() {
        ValidationResult::new()
    } else {
        ValidationResult::with_error(ConsensusError::DuplicateDocumentTransitions { references })
    }
}

fn check_create_ids(context: &BasicContext<'_>) -> ValidationResult {
    let Ok(owner_id) = Identifier::from_value(&context.raw["ownerId"]) else {
        return ValidationResult::new();
    };
    let mut result = ValidationResult::new();
    for transition in raw_transitions(context) {
        if raw_action(transition) != Some(DocumentAction::Create as u64) {
            continue;
        }
        let contract_id = Identifier::from_value(&transition["$dataContractId"]);
        let actual = Identifier::from_value(&transition["$id"]);
        let document_type = transition["$type"].as_str();
        let entropy: Option<[u8; 32]> =
            value_to_bytes(&transition["$entropy"]).and_then(|bytes| bytes.try_into().ok());
        if let (Ok(contract_id), Ok(actual), Some(document_type), Some(entropy)) =
            (contract_id, actual, document_type, entropy)
        {
            let expected = generate_document_id(&contract_id, &owner_id, document_type, &entropy);
            if expected != actual {
                result.add_error(ConsensusError::InvalidDocumentTransitionId { expected, actual });
            }
        }
    }
    result
}

// =============================================================================
// STATE
// =============================================================================

/// Inclusive drift window around the latest block time.
#[derive(Debug, Clone, Copy)]
struct TimeWindow {
    start: u64,
    end: u64,
}

impl TimeWindow {
    fn around(block_time_ms: u64, window_ms: u64) -> Self {
        Self {
            start: block_time_ms.saturating_sub(window_ms),
            end: block_time_ms.saturating_add(window_ms),
        }
    }

    fn check(&self, document_id: Identifier, name: &str, timestamp: Option<u64>) -> Option<ConsensusError> {
        let timestamp = timestamp?;
        (timestamp < self.start || timestamp > self.end).then(|| {
            ConsensusError::DocumentTimestampWindowViolation {
                document_id,
                timestamp_name: name.to_string(),
                timestamp,
                window_start: self.start,
                window_end: self.end,
            }
        })
    }
}

/// Collaborators and per-batch caches for state checks.
struct BatchState<'a> {
    batch: &'a DocumentsBatchTransition,
    repository: &'a dyn StateRepository,
    schemas: &'a dyn SchemaValidator,
    window: TimeWindow,
}

impl BatchState<'_> {
    async fn fetch_document(
        &self,
        contract_id: &Identifier,
        document_type: &str,
        id: &Identifier,
    ) -> Result<Option<Document>, PlatformError> {
        let query = DocumentQuery::all().where_eq("$id", id.to_value());
        Ok(self
            .repository
            .fetch_documents(contract_id, document_type, &query)
            .await?
            .into_iter()
            .next())
    }

    /// Owner check shared by replace and delete.
    fn check_owner(&self, existing: &Document) -> Option<ConsensusError> {
        (existing.owner_id != self.batch.owner_id).then(|| ConsensusError::DocumentOwnerIdMismatch {
            document_id: existing.id,
            document_owner_id: existing.owner_id,
            submitter_id: self.batch.owner_id,
        })
    }

    async fn validate_create(
        &self,
        contract: &DataContract,
        transition: &DocumentCreateTransition,
        result: &mut ValidationResult,
    ) -> Result<Option<Document>, PlatformError> {
        let document = transition.to_document(self.batch.owner_id, self.batch.protocol_version);
        result.merge(self.schemas.validate_document(
            contract,
            &transition.document_type,
            &document.to_object(),
        ));

        if self
            .fetch_document(&contract.id, &transition.document_type, &transition.id)
            .await?
            .is_some()
        {
            result.add_error(ConsensusError::DocumentAlreadyPresent(transition.id));
        }

        result.add_errors(
            [
                self.window.check(transition.id, "$createdAt", transition.created_at),
                self.window.check(transition.id, "$updatedAt", transition.updated_at),
            ]
            .into_iter()
            .flatten(),
        );
        if let (Some(created_at), Some(updated_at)) = (transition.created_at, transition.updated_at) {
            if created_at != updated_at {
                result.add_error(ConsensusError::DocumentTimestampsMismatch(transition.id));
            }
        }
        Ok(Some(document))
    }

    async fn validate_replace(
        &self,
        contract: &DataContract,
        transition: &DocumentReplaceTransition,
        result: &mut ValidationResult,
    ) -> Result<Option<Document>, PlatformError> {
        let Some(existing) = self
            .fetch_document(&contract.id, &transition.document_type, &transition.id)
            .await?
        else {
            result.add_error(ConsensusError::DocumentNotFound(transition.id));
            return Ok(None);
        };

        // The lookup is keyed on contract and type, so only `$createdAt` can drift.
        if transition.created_at.is_some() && transition.created_at != existing.created_at {
            result.add_error(ConsensusError::DocumentImmutableFieldMismatch {
                document_id: transition.id,
                field: "$createdAt".to_string(),
            });
        }

        result.add_errors(self.check_owner(&existing));

        let expected = existing.revision + 1;
        if transition.revision != expected {
            result.add_error(ConsensusError::InvalidDocumentRevision {
                document_id: transition.id,
                expected,
                actual: transition.revision,
            });
        }

        result.add_errors(self.window.check(transition.id, "$updatedAt", transition.updated_at));

        let document = transition.to_document(&existing);
        result.merge(self.schemas.validate_document(
            contract,
            &transition.document_type,
            &document.to_object(),
        ));
        Ok(Some(document))
    }

    async fn validate_delete(
        &self,
        contract: &DataContract,
        transition: &DocumentDeleteTransition,
        result: &mut ValidationResult,
    ) -> Result<(), PlatformError> {
        match self
            .fetch_document(&contract.id, &transition.document_type, &transition.id)
            .await?
        {
            None => result.add_error(ConsensusError::DocumentNotFound(transition.id)),
            Some(existing) => result.add_errors(self.check_owner(&existing)),
        }
        Ok(())
    }
}

/// State checks for a documents batch.
pub async fn validate_documents_batch_state(
    batch: &DocumentsBatchTransition,
    repository: &dyn StateRepository,
    schemas: &dyn SchemaValidator,
    config: &PlatformConfig,
) -> Result<ValidationResult, PlatformError> {
    let block_time = repository.fetch_latest_platform_block_time().await?;
    let state = BatchState {
        batch,
        repository,
        schemas,
        window: TimeWindow::around(block_time, config.block_time_window_ms),
    };

    let mut contracts: HashMap<Identifier, Option<DataContract>> = HashMap::new();
    for contract_id in batch.data_contract_ids() {
        let contract = repository.fetch_data_contract(&contract_id).await?;
        contracts.insert(contract_id, contract);
    }

    let mut result = ValidationResult::new();
    let mut candidates: Vec<Document> = Vec::new();

    for transition in &batch.transitions {
        let contract_id = transition.data_contract_id();
        let Some(Some(contract)) = contracts.get(&contract_id) else {
            result.add_error(ConsensusError::DataContractNotPresent(contract_id));
            continue;
        };
        if !contract.is_document_defined(transition.document_type()) {
            result.add_error(ConsensusError::InvalidDocumentType {
                document_type: transition.document_type().to_string(),
                data_contract_id: contract_id,
            });
            continue;
        }

        let candidate = match transition {
            DocumentTransition::Create(create) => {
                state.validate_create(contract, create, &mut result).await?
            }
            DocumentTransition::Replace(replace) => {
                state.validate_replace(contract, replace, &mut result).await?
            }
            DocumentTransition::Delete(delete) => {
                state.validate_delete(contract, delete, &mut result).await?;
                None
            }
        };
        candidates.extend(candidate);
    }

    result.merge(check_unique_indices(&candidates, &contracts, repository).await?);

    debug!(
        owner_id = %batch.owner_id,
        transitions = batch.transitions.len(),
        errors = result.errors().len(),
        "Documents batch state validated"
    );
    Ok(result)
}

/// Unique index collisions among the batch and against stored documents.
///
/// A document missing any indexed field is not constrained by that index.
async fn check_unique_indices(
    candidates: &[Document],
    contracts: &HashMap<Identifier, Option<DataContract>>,
    repository: &dyn StateRepository,
) -> Result<ValidationResult, PlatformError> {
    type IndexKey = (Identifier, String, String, Vec<Value>);

    let mut groups: Vec<(IndexKey, Vec<usize>)> = Vec::new();
    let mut keyed: Vec<(usize, IndexKey, Vec<String>)> = Vec::new();

    for (position, document) in candidates.iter().enumerate() {
        let Some(Some(contract)) = contracts.get(&document.data_contract_id) else {
            continue;
        };
        for index in contract
            .indices(&document.document_type)
            .into_iter()
            .filter(|index| index.unique)
        {
            let names = index.property_names();
            let Some(values) = names
                .iter()
                .map(|name| document.get(name))
                .collect::<Option<Vec<Value>>>()
            else {
                continue;
            };
            let key = (
                document.data_contract_id,
                document.document_type.clone(),
                index.name.clone(),
                values,
            );
            match groups.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, members)) => members.push(position),
                None => groups.push((key.clone(), vec![position])),
            }
            keyed.push((position, key, names));
        }
    }

    let mut result = ValidationResult::new();
    let mut reported: HashSet<(usize, String)> = HashSet::new();

    for (position, key, names) in &keyed {
        let (contract_id, document_type, index_name, values) = key;
        let document = &candidates[*position];

        let in_batch = groups
            .iter()
            .any(|(group, members)| group == key && members.len() > 1);
        let collides = if in_batch {
            true
        } else {
            let query = names
                .iter()
                .zip(values)
                .fold(DocumentQuery::all(), |query, (name, value)| {
                    query.where_eq(name.clone(), value.clone())
                });
            repository
                .fetch_documents(contract_id, document_type, &query)
                .await?
                .iter()
                .any(|stored| stored.id != document.id)
        };

        if collides && reported.insert((*position, index_name.clone())) {
            result.add_error(ConsensusError::DuplicateUniqueIndex {
                document_id: document.id,
                index_name: index_name.clone(),
                properties: names.clone(),
            });
        }
    }
    Ok(result)
}
