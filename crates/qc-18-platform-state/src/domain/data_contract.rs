//! # Data Contract
//!
//! A versioned registry of document-type schemas owned by one identity.
//! The contract id is derived once, at creation, from the owner and a
//! random entropy; it is never recomputed from stored state.

use crate::domain::errors::PlatformError;
use crate::schema::definitions::{BASE_DOCUMENT_PROPERTIES, BASE_DOCUMENT_REQUIRED};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_types::{sha256d, Identifier};

/// `$schema` URI every contract declares.
pub const DATA_CONTRACT_SCHEMA_URI: &str =
    "https://schema.quantum-chain.io/platform/v1/data-contract.json";

/// Version of a freshly created contract.
pub const INITIAL_CONTRACT_VERSION: u32 = 1;

/// Derive a contract id: `sha256d(owner_id ‖ entropy)`.
pub fn generate_data_contract_id(owner_id: &Identifier, entropy: &[u8; 32]) -> Identifier {
    let mut preimage = Vec::with_capacity(64);
    preimage.extend_from_slice(owner_id.as_bytes());
    preimage.extend_from_slice(entropy);
    Identifier::new(sha256d(&preimage))
}

/// Fresh 32 bytes of entropy for id derivation.
pub fn generate_entropy() -> [u8; 32] {
    let mut entropy = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut entropy);
    entropy
}

/// A data contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataContract {
    pub protocol_version: u32,
    #[serde(rename = "$id")]
    pub id: Identifier,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub owner_id: Identifier,
    pub version: u32,
    pub documents: Map<String, Value>,
    #[serde(rename = "$defs", default, skip_serializing_if = "Option::is_none")]
    pub defs: Option<Map<String, Value>>,
}

impl DataContract {
    /// Build a contract whose id is derived from `(owner_id, entropy)`.
    pub fn new(
        protocol_version: u32,
        owner_id: Identifier,
        entropy: &[u8; 32],
        documents: Map<String, Value>,
        defs: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            protocol_version,
            id: generate_data_contract_id(&owner_id, entropy),
            schema: DATA_CONTRACT_SCHEMA_URI.to_string(),
            owner_id,
            version: INITIAL_CONTRACT_VERSION,
            documents,
            defs,
        }
    }

    /// True if the contract defines `document_type`.
    pub fn is_document_defined(&self, document_type: &str) -> bool {
        self.documents.contains_key(document_type)
    }

    /// The user-declared schema of `document_type`.
    pub fn document_schema(&self, document_type: &str) -> Option<&Value> {
        self.documents.get(document_type)
    }

    /// The type schema merged with the system document fields, carrying
    /// the contract's `$defs` so local references resolve.
    pub fn document_json_schema(&self, document_type: &str) -> Option<Value> {
        let schema = self.documents.get(document_type)?;
        Some(merge_base_document_schema(schema, self.defs.as_ref()))
    }

    /// Index definitions of `document_type`.
    pub fn indices(&self, document_type: &str) -> Vec<Index> {
        self.document_schema(document_type)
            .and_then(|schema| schema.get("indices"))
            .and_then(Value::as_array)
            .map(|indices| indices.iter().filter_map(Index::from_value).collect())
            .unwrap_or_default()
    }

    /// Canonical wire object.
    pub fn to_object(&self) -> Result<Value, PlatformError> {
        serde_json::to_value(self).map_err(|e| PlatformError::Decoding {
            entity: "data contract",
            message: e.to_string(),
        })
    }

    /// Decode a canonical wire object.
    pub fn from_object(value: Value) -> Result<Self, PlatformError> {
        serde_json::from_value(value).map_err(|e| PlatformError::Decoding {
            entity: "data contract",
            message: e.to_string(),
        })
    }
}

/// Merge the system document fields into a type schema.
pub(crate) fn merge_base_document_schema(
    schema: &Value,
    defs: Option<&Map<String, Value>>,
) -> Value {
    let mut merged = schema.clone();
    let Some(object) = merged.as_object_mut() else {
        return merged;
    };

    let properties = object
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(properties) = properties.as_object_mut() {
        for (name, property) in BASE_DOCUMENT_PROPERTIES.iter() {
            properties.insert(name.clone(), property.clone());
        }
    }

    let mut required: Vec<Value> = BASE_DOCUMENT_REQUIRED
        .iter()
        .map(|name| Value::from(*name))
        .collect();
    if let Some(Value::Array(user_required)) = object.get("required") {
        required.extend(user_required.iter().cloned());
    }
    object.insert("required".to_string(), Value::Array(required));

    // Contract metadata, not a JSON-schema keyword.
    object.remove("indices");

    if let Some(defs) = defs {
        object.insert("$defs".to_string(), Value::Object(defs.clone()));
    }

    merged
}

// =============================================================================
// INDICES
// =============================================================================

/// One property of a compound index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexProperty {
    pub name: String,
    pub ascending: bool,
}

/// A document-type index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub properties: Vec<IndexProperty>,
    pub unique: bool,
}

impl Index {
    /// Parse `{ name, properties: [{ field: "asc" | "desc" }], unique? }`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?.to_string();
        let properties = value
            .get("properties")?
            .as_array()?
            .iter()
            .filter_map(|entry| {
                let (field, order) = entry.as_object()?.iter().next()?;
                Some(IndexProperty {
                    name: field.clone(),
                    ascending: order.as_str() != Some("desc"),
                })
            })
            .collect();
        let unique = value.get("unique").and_then(Value::as_bool).unwrap_or(false);
        Some(Self {
            name,
            properties,
            unique,
        })
    }

    /// Property names in index order.
    pub fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name.clone()).collect()
    }
}
