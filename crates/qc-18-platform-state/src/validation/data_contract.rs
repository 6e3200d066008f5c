//! # Data Contract Validation
//!
//! Basic steps, in order:
//!
//! | Step | On failure |
//! |------|------------|
//! | transition schema | halt |
//! | protocol version | halt |
//! | contract meta-schema | halt |
//! | document type schemas compile | halt |
//! | pattern compatibility | continue |
//! | reserved properties | continue |
//! | index definitions | continue |
//! | contract id derivation | continue |
//!
//! State: a contract with the same id must not exist.

use super::basic::{check_protocol_version, BasicContext};
use super::pipeline::ValidationPipeline;
use crate::domain::data_contract::merge_base_document_schema;
use crate::domain::transitions::wire::value_to_bytes;
use crate::domain::{
    generate_data_contract_id, ConsensusError, DataContractCreateTransition, Index, PlatformError,
    ValidationResult,
};
use crate::ports::outbound::StateRepository;
use crate::schema::SchemaKind;
use serde_json::{Map, Value};
use shared_types::Identifier;
use tracing::debug;

/// System fields an index may reference.
const INDEXABLE_SYSTEM_PROPERTIES: &[&str] = &["$id", "$ownerId", "$createdAt", "$updatedAt"];

/// Longest array (a byte string such as an identifier) an index may cover.
const MAX_INDEXED_ARRAY_ITEMS: u64 = 64;

pub(crate) fn basic_pipeline<'a>() -> ValidationPipeline<BasicContext<'a>> {
    ValidationPipeline::new()
        .halt_on_failure("data_contract_create_schema", check_transition_schema)
        .halt_on_failure("protocol_version", check_protocol_version)
        .halt_on_failure("data_contract_schema", check_contract_schema)
        .halt_on_failure("document_schemas", check_document_schemas)
        .continue_on_failure("regex_patterns", check_patterns)
        .continue_on_failure("reserved_properties", check_reserved_properties)
        .continue_on_failure("indices", check_indices)
        .continue_on_failure("data_contract_id", check_contract_id)
}

fn contract<'v>(context: &'v BasicContext<'_>) -> &'v Value {
    &context.raw["dataContract"]
}

fn documents<'v>(context: &'v BasicContext<'_>) -> Option<&'v Map<String, Value>> {
    context.raw["dataContract"]["documents"].as_object()
}

fn check_transition_schema(context: &BasicContext<'_>) -> ValidationResult {
    context
        .schemas
        .validate_static(SchemaKind::DataContractCreate, context.raw)
}

fn check_contract_schema(context: &BasicContext<'_>) -> ValidationResult {
    context
        .schemas
        .validate_static(SchemaKind::DataContract, contract(context))
}

fn check_document_schemas(context: &BasicContext<'_>) -> ValidationResult {
    let mut result = ValidationResult::new();
    let defs = contract(context)["$defs"].as_object();
    for (document_type, schema) in documents(context).into_iter().flatten() {
        let merged = merge_base_document_schema(schema, defs);
        if let Err(message) = context.schemas.check_schema(&merged) {
            result.add_error(ConsensusError::InvalidDocumentSchema {
                document_type: document_type.clone(),
                message,
            });
        }
    }
    result
}

fn check_patterns(context: &BasicContext<'_>) -> ValidationResult {
    let contract = contract(context);
    let mut errors = context
        .patterns
        .validate_schema_patterns(&contract["documents"], "/documents");
    if let Some(defs) = contract.get("$defs") {
        errors.extend(context.patterns.validate_schema_patterns(defs, "/$defs"));
    }
    ValidationResult::with_errors(errors)
}

fn check_reserved_properties(context: &BasicContext<'_>) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (document_type, schema) in documents(context).into_iter().flatten() {
        let Some(properties) = schema["properties"].as_object() else {
            continue;
        };
        for property in properties.keys().filter(|name| name.starts_with('$')) {
            result.add_error(ConsensusError::ReservedDocumentProperty {
                document_type: document_type.clone(),
                property: property.clone(),
            });
        }
    }
    result
}

/// Resolve a dotted property path through nested `properties` maps.
fn property_schema<'v>(schema: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(schema, |current, segment| current["properties"].get(segment))
}

fn check_indices(context: &BasicContext<'_>) -> ValidationResult {
    let mut result = ValidationResult::new();
    let max_unique = context.config.max_unique_indices;

    for (document_type, schema) in documents(context).into_iter().flatten() {
        let indices: Vec<Index> = schema["indices"]
            .as_array()
            .map(|list| list.iter().filter_map(Index::from_value).collect())
            .unwrap_or_default();

        let mut seen: Vec<Vec<String>> = Vec::new();
        for index in &indices {
            for property in &index.properties {
                if property.name.starts_with('$') {
                    if !INDEXABLE_SYSTEM_PROPERTIES.contains(&property.name.as_str()) {
                        result.add_error(ConsensusError::UndefinedIndexProperty {
                            document_type: document_type.clone(),
                            index_name: index.name.clone(),
                            property: property.name.clone(),
                        });
                    }
                    continue;
                }
                match property_schema(schema, &property.name) {
                    None => result.add_error(ConsensusError::UndefinedIndexProperty {
                        document_type: document_type.clone(),
                        index_name: index.name.clone(),
                        property: property.name.clone(),
                    }),
                    Some(definition) => {
                        if let Some(property_type) = unindexable_type(definition) {
                            result.add_error(ConsensusError::InvalidIndexPropertyType {
                                document_type: document_type.clone(),
                                index_name: index.name.clone(),
                                property: property.name.clone(),
                                property_type: property_type.to_string(),
                            });
                        }
                    }
                }
            }

            let names = index.property_names();
            if seen.contains(&names) {
                result.add_error(ConsensusError::DuplicateIndex {
                    document_type: document_type.clone(),
                    index_name: index.name.clone(),
                });
            } else {
                seen.push(names);
            }
        }

        if indices.iter().filter(|index| index.unique).count() > max_unique {
            result.add_error(ConsensusError::UniqueIndicesLimitReached {
                document_type: document_type.clone(),
                limit: max_unique,
            });
        }
    }
    result
}

/// Objects and general arrays cannot be indexed; short integer arrays
/// (byte strings) can.
fn unindexable_type(definition: &Value) -> Option<&'static str> {
    match definition["type"].as_str() {
        Some("object") => Some("object"),
        Some("array") => {
            let byte_items = definition["items"]["type"] == "integer";
            let bounded = definition["maxItems"]
                .as_u64()
                .is_some_and(|max| max <= MAX_INDEXED_ARRAY_ITEMS);
            (!(byte_items && bounded)).then_some("array")
        }
        _ => None,
    }
}

fn check_contract_id(context: &BasicContext<'_>) -> ValidationResult {
    let contract = contract(context);
    let owner_id = Identifier::from_value(&contract["ownerId"]);
    let declared = Identifier::from_value(&contract["$id"]);
    let entropy: Option<[u8; 32]> =
        value_to_bytes(&context.raw["entropy"]).and_then(|bytes| bytes.try_into().ok());

    match (owner_id, declared, entropy) {
        (Ok(owner_id), Ok(actual), Some(entropy)) => {
            let expected = generate_data_contract_id(&owner_id, &entropy);
            if expected == actual {
                ValidationResult::new()
            } else {
                ValidationResult::with_error(ConsensusError::InvalidDataContractId {
                    expected,
                    actual,
                })
            }
        }
        _ => ValidationResult::with_error(ConsensusError::JsonSchema {
            message: "contract id, owner id and entropy must be 32-byte arrays".into(),
        }),
    }
}

/// Reject creation of a contract that already exists.
pub async fn validate_data_contract_create_state(
    transition: &DataContractCreateTransition,
    repository: &dyn StateRepository,
) -> Result<ValidationResult, PlatformError> {
    let id = transition.data_contract.id;
    let mut result = ValidationResult::new();
    if repository.fetch_data_contract(&id).await?.is_some() {
        debug!(contract_id = %id, "Data contract already present");
        result.add_error(ConsensusError::DataContractAlreadyPresent(id));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryStateRepository, JsonSchemaValidator};
    use crate::config::PlatformConfig;
    use crate::domain::StateTransition;
    use crate::schema::PatternEngine;
    use crate::test_utils::note_documents;
    use serde_json::json;

    fn transition(documents: Value) -> DataContractCreateTransition {
        DataContractCreateTransition::new(
            1,
            Identifier::new([1; 32]),
            documents.as_object().cloned().unwrap(),
            0,
        )
    }

    async fn run(raw: &Value) -> super::super::pipeline::PipelineOutcome {
        let config = PlatformConfig::default();
        let schemas = JsonSchemaValidator::new().unwrap();
        let patterns = PatternEngine::shared().await;
        let context = BasicContext {
            raw,
            config: &config,
            schemas: &schemas,
            patterns: &patterns,
        };
        basic_pipeline().run(&context)
    }

    fn object(st: DataContractCreateTransition) -> Value {
        StateTransition::DataContractCreate(st).to_object().unwrap()
    }

    #[tokio::test]
    async fn test_valid_contract_passes_every_step() {
        let outcome = run(&object(transition(Value::Object(note_documents())))).await;
        assert!(outcome.result.is_valid(), "{:?}", outcome.result.errors());
        assert_eq!(outcome.executed.len(), 8);
    }

    #[tokio::test]
    async fn test_incompatible_pattern_rejected_simple_accepted() {
        let documents = json!({
            "word": {
                "type": "object",
                "properties": {
                    "bad": { "type": "string", "pattern": "(a+)+$" },
                    "good": { "type": "string", "pattern": "^[a-z]+$" }
                },
                "additionalProperties": false
            }
        });
        let outcome = run(&object(transition(documents))).await;
        assert_eq!(outcome.halted_at, None);
        match outcome.result.errors() {
            [ConsensusError::IncompatibleRegexPattern { pattern, path, .. }] => {
                assert_eq!(pattern, "(a+)+$");
                assert_eq!(path, "/documents/word/properties/bad/pattern");
            }
            other => panic!("unexpected errors {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_declared_id_mismatch_is_consensus_error() {
        let mut st = transition(Value::Object(note_documents()));
        let expected = st.data_contract.id;
        st.data_contract.id = Identifier::new([0xEE; 32]);
        let outcome = run(&object(st)).await;
        assert_eq!(
            outcome.result.errors(),
            &[ConsensusError::InvalidDataContractId {
                expected,
                actual: Identifier::new([0xEE; 32])
            }]
        );
    }

    #[tokio::test]
    async fn test_semantic_errors_all_reported() {
        let documents = json!({
            "thing": {
                "type": "object",
                "properties": {
                    "$secret": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" } },
                    "name": { "type": "string" }
                },
                "indices": [
                    { "name": "a", "properties": [{ "missing": "asc" }] },
                    { "name": "b", "properties": [{ "tags": "asc" }] },
                    { "name": "c", "properties": [{ "name": "asc" }], "unique": true },
                    { "name": "d", "properties": [{ "name": "asc" }], "unique": true },
                    { "name": "e", "properties": [{ "$ownerId": "asc" }], "unique": true },
                    { "name": "f", "properties": [{ "$ownerId": "asc" }, { "name": "asc" }], "unique": true }
                ],
                "additionalProperties": false
            }
        });
        let outcome = run(&object(transition(documents))).await;
        let codes: Vec<u32> = outcome.result.errors().iter().map(ConsensusError::code).collect();
        assert_eq!(
            codes,
            vec![
                1013, // "$secret"
                1014, // undefined "missing"
                1015, // array "tags"
                1016, // "d" duplicates "c"
                1017, // four unique indices
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_document_schema_halts() {
        let documents = json!({
            "thing": {
                "type": "object",
                "properties": { "n": { "type": "integer", "minimum": "zero" } },
                "additionalProperties": false
            }
        });
        let outcome = run(&object(transition(documents))).await;
        assert_eq!(outcome.halted_at, Some("document_schemas"));
        assert!(matches!(
            outcome.result.errors(),
            [ConsensusError::InvalidDocumentSchema { .. }]
        ));
    }

    #[tokio::test]
    async fn test_state_rejects_existing_contract() {
        let repository = InMemoryStateRepository::new();
        let st = transition(Value::Object(note_documents()));
        assert!(validate_data_contract_create_state(&st, &repository)
            .await
            .unwrap()
            .is_valid());

        repository
            .store_data_contract(st.data_contract.clone())
            .await
            .unwrap();
        let result = validate_data_contract_create_state(&st, &repository)
            .await
            .unwrap();
        assert_eq!(
            result.errors(),
            &[ConsensusError::DataContractAlreadyPresent(st.data_contract.id)]
        );
    }
}
