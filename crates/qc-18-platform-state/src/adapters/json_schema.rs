//! # JSON Schema Adapter
//!
//! [`SchemaValidator`] backed by the `jsonschema` crate. Built-in schemas
//! are compiled once at construction; document type schemas are compiled
//! on first use and cached per (contract, type).

use crate::domain::{ConsensusError, DataContract, PlatformError, ValidationResult};
use crate::ports::outbound::SchemaValidator;
use crate::schema::SchemaKind;
use jsonschema::Validator;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::Identifier;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// `jsonschema`-backed validator.
pub struct JsonSchemaValidator {
    compiled: HashMap<SchemaKind, Validator>,
    document_cache: RwLock<HashMap<(Identifier, String), Arc<Validator>>>,
}

impl JsonSchemaValidator {
    /// Compile every built-in schema.
    pub fn new() -> Result<Self, PlatformError> {
        let mut compiled = HashMap::with_capacity(SchemaKind::ALL.len());
        for kind in SchemaKind::ALL {
            let validator = jsonschema::validator_for(kind.schema()).map_err(|e| {
                PlatformError::InvalidStaticSchema {
                    name: kind.name(),
                    message: e.to_string(),
                }
            })?;
            compiled.insert(kind, validator);
        }
        debug!(schemas = compiled.len(), "Static schemas compiled");
        Ok(Self {
            compiled,
            document_cache: RwLock::new(HashMap::new()),
        })
    }

    fn collect(validator: &Validator, instance: &Value) -> ValidationResult {
        let errors = validator
            .iter_errors(instance)
            .map(|error| ConsensusError::JsonSchema {
                message: error.to_string(),
            })
            .collect();
        ValidationResult::with_errors(errors)
    }

    fn document_validator(
        &self,
        contract: &DataContract,
        document_type: &str,
    ) -> Result<Option<Arc<Validator>>, String> {
        let key = (contract.id, document_type.to_string());
        if let Some(validator) = self.document_cache.read().get(&key) {
            return Ok(Some(Arc::clone(validator)));
        }
        let Some(schema) = contract.document_json_schema(document_type) else {
            return Ok(None);
        };
        let validator = Arc::new(jsonschema::validator_for(&schema).map_err(|e| e.to_string())?);
        self.document_cache
            .write()
            .insert(key, Arc::clone(&validator));
        Ok(Some(validator))
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate_static(&self, kind: SchemaKind, instance: &Value) -> ValidationResult {
        match self.compiled.get(&kind) {
            Some(validator) => Self::collect(validator, instance),
            None => ValidationResult::with_error(ConsensusError::JsonSchema {
                message: format!("schema '{}' is not loaded", kind.name()),
            }),
        }
    }

    fn validate(&self, schema: &Value, instance: &Value) -> ValidationResult {
        match jsonschema::validator_for(schema) {
            Ok(validator) => Self::collect(&validator, instance),
            Err(e) => ValidationResult::with_error(ConsensusError::JsonSchema {
                message: format!("schema does not compile: {e}"),
            }),
        }
    }

    fn check_schema(&self, schema: &Value) -> Result<(), String> {
        jsonschema::validator_for(schema)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn validate_document(
        &self,
        contract: &DataContract,
        document_type: &str,
        document: &Value,
    ) -> ValidationResult {
        match self.document_validator(contract, document_type) {
            Ok(Some(validator)) => Self::collect(&validator, document),
            Ok(None) => ValidationResult::with_error(ConsensusError::InvalidDocumentType {
                document_type: document_type.to_string(),
                data_contract_id: contract.id,
            }),
            Err(message) => ValidationResult::with_error(ConsensusError::InvalidDocumentSchema {
                document_type: document_type.to_string(),
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::note_contract;
    use serde_json::json;

    #[test]
    fn test_static_schemas_compile() {
        assert!(JsonSchemaValidator::new().is_ok());
    }

    #[test]
    fn test_static_validation_reports_errors() {
        let validator = JsonSchemaValidator::new().unwrap();
        let result = validator.validate_static(
            SchemaKind::ChainAssetLockProof,
            &json!({ "type": 1, "coreChainLockedHeight": 0, "outPoint": [1, 2] }),
        );
        assert!(!result.is_valid());
        assert!(result
            .errors()
            .iter()
            .all(|e| matches!(e, ConsensusError::JsonSchema { .. })));
    }

    #[test]
    fn test_check_schema_rejects_malformed_schema() {
        let validator = JsonSchemaValidator::new().unwrap();
        assert!(validator.check_schema(&json!({ "type": "object" })).is_ok());
        assert!(validator.check_schema(&json!({ "type": 12 })).is_err());
    }

    #[test]
    fn test_document_validation_uses_merged_schema() {
        let validator = JsonSchemaValidator::new().unwrap();
        let contract = note_contract(Identifier::new([1; 32]));
        let id = Identifier::new([2; 32]);
        let mut document = json!({
            "$protocolVersion": 1,
            "$id": id.to_value(),
            "$type": "note",
            "$dataContractId": contract.id.to_value(),
            "$ownerId": contract.owner_id.to_value(),
            "$revision": 1,
            "message": "hello"
        });
        assert!(validator
            .validate_document(&contract, "note", &document)
            .is_valid());

        document["extra"] = json!(true);
        assert!(!validator
            .validate_document(&contract, "note", &document)
            .is_valid());

        let missing = validator.validate_document(&contract, "nope", &document);
        assert!(matches!(
            missing.first_error(),
            Some(ConsensusError::InvalidDocumentType { .. })
        ));
    }
}
