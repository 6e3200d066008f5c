//! # Document
//!
//! A schema-validated record owned by one identity under a contract's
//! document type. System fields carry a `$` prefix; everything else is
//! user data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_types::{sha256d, Identifier};

/// Revision of a freshly created document.
pub const INITIAL_REVISION: u64 = 1;

/// Derive a document id: `sha256d(contract_id ‖ owner_id ‖ type ‖ entropy)`.
pub fn generate_document_id(
    data_contract_id: &Identifier,
    owner_id: &Identifier,
    document_type: &str,
    entropy: &[u8; 32],
) -> Identifier {
    let mut preimage = Vec::with_capacity(96 + document_type.len());
    preimage.extend_from_slice(data_contract_id.as_bytes());
    preimage.extend_from_slice(owner_id.as_bytes());
    preimage.extend_from_slice(document_type.as_bytes());
    preimage.extend_from_slice(entropy);
    Identifier::new(sha256d(&preimage))
}

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$protocolVersion")]
    pub protocol_version: u32,
    #[serde(rename = "$id")]
    pub id: Identifier,
    #[serde(rename = "$type")]
    pub document_type: String,
    #[serde(rename = "$dataContractId")]
    pub data_contract_id: Identifier,
    #[serde(rename = "$ownerId")]
    pub owner_id: Identifier,
    #[serde(rename = "$revision")]
    pub revision: u64,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    /// Canonical wire object: system fields followed by user data.
    pub fn to_object(&self) -> Value {
        let mut object = Map::new();
        object.insert("$protocolVersion".into(), Value::from(self.protocol_version));
        object.insert("$id".into(), self.id.to_value());
        object.insert("$type".into(), Value::from(self.document_type.clone()));
        object.insert("$dataContractId".into(), self.data_contract_id.to_value());
        object.insert("$ownerId".into(), self.owner_id.to_value());
        object.insert("$revision".into(), Value::from(self.revision));
        if let Some(created_at) = self.created_at {
            object.insert("$createdAt".into(), Value::from(created_at));
        }
        if let Some(updated_at) = self.updated_at {
            object.insert("$updatedAt".into(), Value::from(updated_at));
        }
        for (key, value) in &self.data {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }

    /// Resolve a system field (`$ownerId`) or dotted data path
    /// (`records.dashUniqueIdentityId`) to its canonical value.
    pub fn get(&self, path: &str) -> Option<Value> {
        match path {
            "$id" => Some(self.id.to_value()),
            "$type" => Some(Value::from(self.document_type.clone())),
            "$dataContractId" => Some(self.data_contract_id.to_value()),
            "$ownerId" => Some(self.owner_id.to_value()),
            "$revision" => Some(Value::from(self.revision)),
            "$createdAt" => self.created_at.map(Value::from),
            "$updatedAt" => self.updated_at.map(Value::from),
            _ => get_data_path(&self.data, path).cloned(),
        }
    }
}

/// Walk a dotted path through nested objects.
pub(crate) fn get_data_path<'a>(data: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = data.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Document {
        Document {
            protocol_version: 1,
            id: Identifier::new([1; 32]),
            document_type: "domain".into(),
            data_contract_id: Identifier::new([2; 32]),
            owner_id: Identifier::new([3; 32]),
            revision: INITIAL_REVISION,
            created_at: Some(1_000),
            updated_at: None,
            data: json!({ "label": "alice", "records": { "owner": "x" } })
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    #[test]
    fn test_document_id_depends_on_every_input() {
        let contract = Identifier::new([1; 32]);
        let owner = Identifier::new([2; 32]);
        let base = generate_document_id(&contract, &owner, "note", &[0; 32]);
        assert_eq!(base, generate_document_id(&contract, &owner, "note", &[0; 32]));
        assert_ne!(base, generate_document_id(&contract, &owner, "notes", &[0; 32]));
        assert_ne!(base, generate_document_id(&contract, &owner, "note", &[1; 32]));
        assert_ne!(base, generate_document_id(&owner, &contract, "note", &[0; 32]));
    }

    #[test]
    fn test_get_resolves_system_and_nested_fields() {
        let doc = document();
        assert_eq!(doc.get("$ownerId"), Some(Identifier::new([3; 32]).to_value()));
        assert_eq!(doc.get("label"), Some(json!("alice")));
        assert_eq!(doc.get("records.owner"), Some(json!("x")));
        assert_eq!(doc.get("records.missing"), None);
        assert_eq!(doc.get("$updatedAt"), None);
    }

    #[test]
    fn test_object_form_matches_serde_form() {
        let doc = document();
        let object = doc.to_object();
        assert_eq!(object, serde_json::to_value(&doc).unwrap());
        let back: Document = serde_json::from_value(object).unwrap();
        assert_eq!(back, doc);
    }
}
