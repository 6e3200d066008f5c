//! # Static Schemas
//!
//! JSON schemas for every transition kind, the data contract meta-schema,
//! and the system document fields merged into each document type.
//! Binary fields are byte arrays in every schema.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

/// Built-in schema selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    DataContractCreate,
    DataContract,
    DocumentsBatch,
    DocumentCreate,
    DocumentReplace,
    DocumentDelete,
    IdentityCreate,
    IdentityTopUp,
    InstantAssetLockProof,
    ChainAssetLockProof,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 10] = [
        Self::DataContractCreate,
        Self::DataContract,
        Self::DocumentsBatch,
        Self::DocumentCreate,
        Self::DocumentReplace,
        Self::DocumentDelete,
        Self::IdentityCreate,
        Self::IdentityTopUp,
        Self::InstantAssetLockProof,
        Self::ChainAssetLockProof,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::DataContractCreate => "dataContractCreate",
            Self::DataContract => "dataContract",
            Self::DocumentsBatch => "documentsBatch",
            Self::DocumentCreate => "documentCreate",
            Self::DocumentReplace => "documentReplace",
            Self::DocumentDelete => "documentDelete",
            Self::IdentityCreate => "identityCreate",
            Self::IdentityTopUp => "identityTopUp",
            Self::InstantAssetLockProof => "instantAssetLockProof",
            Self::ChainAssetLockProof => "chainAssetLockProof",
        }
    }

    pub fn schema(self) -> &'static Value {
        match self {
            Self::DataContractCreate => &DATA_CONTRACT_CREATE,
            Self::DataContract => &DATA_CONTRACT,
            Self::DocumentsBatch => &DOCUMENTS_BATCH,
            Self::DocumentCreate => &DOCUMENT_CREATE,
            Self::DocumentReplace => &DOCUMENT_REPLACE,
            Self::DocumentDelete => &DOCUMENT_DELETE,
            Self::IdentityCreate => &IDENTITY_CREATE,
            Self::IdentityTopUp => &IDENTITY_TOP_UP,
            Self::InstantAssetLockProof => &INSTANT_ASSET_LOCK_PROOF,
            Self::ChainAssetLockProof => &CHAIN_ASSET_LOCK_PROOF,
        }
    }
}

fn byte_array(min: usize, max: usize) -> Value {
    json!({
        "type": "array",
        "items": { "type": "integer", "minimum": 0, "maximum": 255 },
        "minItems": min,
        "maxItems": max
    })
}

fn identifier() -> Value {
    byte_array(32, 32)
}

fn non_negative() -> Value {
    json!({ "type": "integer", "minimum": 0 })
}

fn signature() -> Value {
    byte_array(0, 96)
}

/// Names of document types, `$defs` entries and index names.
pub const NAME_PATTERN: &str = "^[a-zA-Z0-9_-]{1,64}$";

/// System document fields, merged into every document type schema.
pub static BASE_DOCUMENT_PROPERTIES: Lazy<Map<String, Value>> = Lazy::new(|| {
    let value = json!({
        "$protocolVersion": non_negative(),
        "$id": identifier(),
        "$type": { "type": "string", "minLength": 1, "maxLength": 64 },
        "$dataContractId": identifier(),
        "$ownerId": identifier(),
        "$revision": { "type": "integer", "minimum": 1 },
        "$createdAt": non_negative(),
        "$updatedAt": non_negative()
    });
    value.as_object().cloned().unwrap_or_default()
});

/// System fields every document carries.
pub const BASE_DOCUMENT_REQUIRED: &[&str] = &[
    "$protocolVersion",
    "$id",
    "$type",
    "$dataContractId",
    "$ownerId",
    "$revision",
];

static INDEX_DEFINITION: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["name", "properties"],
        "properties": {
            "name": { "type": "string", "minLength": 1, "maxLength": 32 },
            "properties": {
                "type": "array",
                "minItems": 1,
                "maxItems": 10,
                "items": {
                    "type": "object",
                    "minProperties": 1,
                    "maxProperties": 1,
                    "additionalProperties": { "enum": ["asc", "desc"] }
                }
            },
            "unique": { "type": "boolean" }
        },
        "additionalProperties": false
    })
});

static DOCUMENT_TYPE_DEFINITION: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["type", "properties", "additionalProperties"],
        "properties": {
            "type": { "const": "object" },
            "properties": { "type": "object", "minProperties": 1, "maxProperties": 100 },
            "required": { "type": "array", "items": { "type": "string" } },
            "additionalProperties": { "const": false },
            "indices": { "type": "array", "maxItems": 10, "items": INDEX_DEFINITION.clone() }
        }
    })
});

/// Data contract meta-schema.
pub static DATA_CONTRACT: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["protocolVersion", "$id", "$schema", "ownerId", "version", "documents"],
        "properties": {
            "protocolVersion": non_negative(),
            "$id": identifier(),
            "$schema": { "type": "string", "minLength": 1 },
            "ownerId": identifier(),
            "version": { "type": "integer", "minimum": 1 },
            "documents": {
                "type": "object",
                "minProperties": 1,
                "maxProperties": 100,
                "propertyNames": { "pattern": NAME_PATTERN },
                "additionalProperties": DOCUMENT_TYPE_DEFINITION.clone()
            },
            "$defs": {
                "type": "object",
                "propertyNames": { "pattern": NAME_PATTERN },
                "additionalProperties": { "type": "object" }
            }
        },
        "additionalProperties": false
    })
});

pub static DATA_CONTRACT_CREATE: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["protocolVersion", "type", "dataContract", "entropy", "signaturePublicKeyId", "signature"],
        "properties": {
            "protocolVersion": non_negative(),
            "type": { "const": 0 },
            "dataContract": { "type": "object" },
            "entropy": identifier(),
            "signaturePublicKeyId": non_negative(),
            "signature": signature()
        },
        "additionalProperties": false
    })
});

pub static DOCUMENTS_BATCH: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["protocolVersion", "type", "ownerId", "transitions", "signaturePublicKeyId", "signature"],
        "properties": {
            "protocolVersion": non_negative(),
            "type": { "const": 1 },
            "ownerId": identifier(),
            "transitions": {
                "type": "array",
                "minItems": 1,
                "items": { "type": "object" }
            },
            "signaturePublicKeyId": non_negative(),
            "signature": signature()
        },
        "additionalProperties": false
    })
});

fn document_transition_base() -> Map<String, Value> {
    let value = json!({
        "$action": non_negative(),
        "$id": identifier(),
        "$type": { "type": "string", "minLength": 1, "maxLength": 64 },
        "$dataContractId": identifier()
    });
    value.as_object().cloned().unwrap_or_default()
}

pub static DOCUMENT_CREATE: Lazy<Value> = Lazy::new(|| {
    let mut properties = document_transition_base();
    properties.insert("$entropy".into(), identifier());
    properties.insert("$createdAt".into(), non_negative());
    properties.insert("$updatedAt".into(), non_negative());
    json!({
        "type": "object",
        "required": ["$action", "$id", "$type", "$dataContractId", "$entropy"],
        "properties": properties
    })
});

pub static DOCUMENT_REPLACE: Lazy<Value> = Lazy::new(|| {
    let mut properties = document_transition_base();
    properties.insert("$revision".into(), json!({ "type": "integer", "minimum": 1 }));
    properties.insert("$createdAt".into(), non_negative());
    properties.insert("$updatedAt".into(), non_negative());
    json!({
        "type": "object",
        "required": ["$action", "$id", "$type", "$dataContractId", "$revision"],
        "properties": properties
    })
});

pub static DOCUMENT_DELETE: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["$action", "$id", "$type", "$dataContractId"],
        "properties": document_transition_base(),
        "additionalProperties": false
    })
});

static IDENTITY_PUBLIC_KEY: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["id", "type", "data"],
        "properties": {
            "id": non_negative(),
            "type": { "enum": [0, 1, 2] },
            "data": byte_array(20, 48),
            "enabled": { "type": "boolean" }
        },
        "additionalProperties": false
    })
});

pub static IDENTITY_CREATE: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["protocolVersion", "type", "assetLockProof", "publicKeys", "signature"],
        "properties": {
            "protocolVersion": non_negative(),
            "type": { "const": 2 },
            "assetLockProof": { "type": "object" },
            "publicKeys": {
                "type": "array",
                "minItems": 1,
                "maxItems": 10,
                "items": IDENTITY_PUBLIC_KEY.clone()
            },
            "signature": signature()
        },
        "additionalProperties": false
    })
});

pub static IDENTITY_TOP_UP: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["protocolVersion", "type", "assetLockProof", "identityId", "signature"],
        "properties": {
            "protocolVersion": non_negative(),
            "type": { "const": 3 },
            "assetLockProof": { "type": "object" },
            "identityId": identifier(),
            "signature": signature()
        },
        "additionalProperties": false
    })
});

pub static INSTANT_ASSET_LOCK_PROOF: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["type", "transaction", "outputIndex", "instantLock"],
        "properties": {
            "type": { "const": 0 },
            "transaction": byte_array(1, 100_000),
            "outputIndex": { "type": "integer", "minimum": 0, "maximum": u32::MAX },
            "instantLock": byte_array(1, 10_000)
        },
        "additionalProperties": false
    })
});

pub static CHAIN_ASSET_LOCK_PROOF: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["type", "coreChainLockedHeight", "outPoint"],
        "properties": {
            "type": { "const": 1 },
            "coreChainLockedHeight": { "type": "integer", "minimum": 1, "maximum": u32::MAX },
            "outPoint": byte_array(36, 36)
        },
        "additionalProperties": false
    })
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_an_object_schema() {
        for kind in SchemaKind::ALL {
            assert_eq!(kind.schema()["type"], "object", "{}", kind.name());
        }
    }

    #[test]
    fn test_base_document_fields_cover_required() {
        for name in BASE_DOCUMENT_REQUIRED {
            assert!(BASE_DOCUMENT_PROPERTIES.contains_key(*name));
        }
    }
}
