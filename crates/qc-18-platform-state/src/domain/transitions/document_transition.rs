//! # Document Transitions
//!
//! Sub-transitions carried by a documents batch, tagged by `$action`:
//!
//! | Action | Discriminant |
//! |--------|--------------|
//! | Create | 0 |
//! | Replace | 1 |
//! | Delete | 3 |

use crate::domain::data_contract::DataContract;
use crate::domain::document::{generate_document_id, Document, INITIAL_REVISION};
use crate::domain::errors::PlatformError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use shared_types::Identifier;

/// Document transition discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DocumentAction {
    Create = 0,
    Replace = 1,
    Delete = 3,
}

impl DocumentAction {
    pub fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Replace => "replace",
            Self::Delete => "delete",
        }
    }
}

impl TryFrom<u64> for DocumentAction {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Create),
            1 => Ok(Self::Replace),
            3 => Ok(Self::Delete),
            other => Err(other),
        }
    }
}

/// Create a new document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentCreateTransition {
    #[serde(rename = "$id")]
    pub id: Identifier,
    #[serde(rename = "$type")]
    pub document_type: String,
    #[serde(rename = "$dataContractId")]
    pub data_contract_id: Identifier,
    #[serde(rename = "$entropy")]
    pub entropy: [u8; 32],
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl DocumentCreateTransition {
    /// Create transition whose id is derived from the given entropy.
    pub fn new(
        contract: &DataContract,
        owner_id: &Identifier,
        document_type: impl Into<String>,
        entropy: [u8; 32],
        data: Map<String, Value>,
    ) -> Self {
        let document_type = document_type.into();
        Self {
            id: generate_document_id(&contract.id, owner_id, &document_type, &entropy),
            document_type,
            data_contract_id: contract.id,
            entropy,
            created_at: None,
            updated_at: None,
            data,
        }
    }

    /// Id this transition must carry for its entropy.
    pub fn expected_id(&self, owner_id: &Identifier) -> Identifier {
        generate_document_id(
            &self.data_contract_id,
            owner_id,
            &self.document_type,
            &self.entropy,
        )
    }

    /// The document this transition creates.
    pub fn to_document(&self, owner_id: Identifier, protocol_version: u32) -> Document {
        Document {
            protocol_version,
            id: self.id,
            document_type: self.document_type.clone(),
            data_contract_id: self.data_contract_id,
            owner_id,
            revision: INITIAL_REVISION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            data: self.data.clone(),
        }
    }
}

/// Replace the data of an existing document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReplaceTransition {
    #[serde(rename = "$id")]
    pub id: Identifier,
    #[serde(rename = "$type")]
    pub document_type: String,
    #[serde(rename = "$dataContractId")]
    pub data_contract_id: Identifier,
    #[serde(rename = "$revision")]
    pub revision: u64,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl DocumentReplaceTransition {
    /// The stored document after replacement. Identity fields and the
    /// creation time are carried forward from `existing`.
    pub fn to_document(&self, existing: &Document) -> Document {
        Document {
            protocol_version: existing.protocol_version,
            id: existing.id,
            document_type: existing.document_type.clone(),
            data_contract_id: existing.data_contract_id,
            owner_id: existing.owner_id,
            revision: self.revision,
            created_at: existing.created_at,
            updated_at: self.updated_at.or(existing.updated_at),
            data: self.data.clone(),
        }
    }
}

/// Delete an existing document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDeleteTransition {
    #[serde(rename = "$id")]
    pub id: Identifier,
    #[serde(rename = "$type")]
    pub document_type: String,
    #[serde(rename = "$dataContractId")]
    pub data_contract_id: Identifier,
}

/// A documents batch sub-transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentTransition {
    Create(DocumentCreateTransition),
    Replace(DocumentReplaceTransition),
    Delete(DocumentDeleteTransition),
}

impl DocumentTransition {
    pub fn action(&self) -> DocumentAction {
        match self {
            Self::Create(_) => DocumentAction::Create,
            Self::Replace(_) => DocumentAction::Replace,
            Self::Delete(_) => DocumentAction::Delete,
        }
    }

    pub fn id(&self) -> Identifier {
        match self {
            Self::Create(t) => t.id,
            Self::Replace(t) => t.id,
            Self::Delete(t) => t.id,
        }
    }

    pub fn document_type(&self) -> &str {
        match self {
            Self::Create(t) => &t.document_type,
            Self::Replace(t) => &t.document_type,
            Self::Delete(t) => &t.document_type,
        }
    }

    pub fn data_contract_id(&self) -> Identifier {
        match self {
            Self::Create(t) => t.data_contract_id,
            Self::Replace(t) => t.data_contract_id,
            Self::Delete(t) => t.data_contract_id,
        }
    }

    /// User data, absent for deletes.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Create(t) => Some(&t.data),
            Self::Replace(t) => Some(&t.data),
            Self::Delete(_) => None,
        }
    }

    /// Canonical wire object with its `$action` discriminant.
    pub fn to_object(&self) -> Result<Value, PlatformError> {
        let body = match self {
            Self::Create(t) => serde_json::to_value(t),
            Self::Replace(t) => serde_json::to_value(t),
            Self::Delete(t) => serde_json::to_value(t),
        }
        .map_err(|e| decoding_error(e.to_string()))?;
        let mut object = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        object.insert("$action".into(), Value::from(self.action() as u8));
        Ok(Value::Object(object))
    }

    /// Decode a canonical wire object.
    pub fn from_object(mut value: Value) -> Result<Self, PlatformError> {
        let object = value
            .as_object_mut()
            .ok_or_else(|| decoding_error("expected an object".into()))?;
        let action = object
            .remove("$action")
            .and_then(|a| a.as_u64())
            .ok_or_else(|| decoding_error("missing $action".into()))
            .and_then(|a| {
                DocumentAction::try_from(a)
                    .map_err(|a| decoding_error(format!("unknown $action {a}")))
            })?;
        match action {
            DocumentAction::Create => serde_json::from_value(value).map(Self::Create),
            DocumentAction::Replace => serde_json::from_value(value).map(Self::Replace),
            DocumentAction::Delete => serde_json::from_value(value).map(Self::Delete),
        }
        .map_err(|e| decoding_error(e.to_string()))
    }
}

fn decoding_error(message: String) -> PlatformError {
    PlatformError::Decoding {
        entity: "document transition",
        message,
    }
}

impl Serialize for DocumentTransition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DocumentTransition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_object(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract() -> DataContract {
        let documents = json!({ "note": { "type": "object" } });
        DataContract::new(
            1,
            Identifier::new([1; 32]),
            &[2; 32],
            documents.as_object().cloned().unwrap(),
            None,
        )
    }

    fn data(message: &str) -> Map<String, Value> {
        json!({ "message": message }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_id_derived_from_entropy() {
        let owner = Identifier::new([9; 32]);
        let create = DocumentCreateTransition::new(&contract(), &owner, "note", [3; 32], data("hi"));
        assert_eq!(create.id, create.expected_id(&owner));
        assert_ne!(create.id, create.expected_id(&Identifier::new([8; 32])));
    }

    #[test]
    fn test_object_keeps_action_and_user_data() {
        let owner = Identifier::new([9; 32]);
        let transition = DocumentTransition::Create(DocumentCreateTransition::new(
            &contract(),
            &owner,
            "note",
            [3; 32],
            data("hi"),
        ));
        let object = transition.to_object().unwrap();
        assert_eq!(object["$action"], 0);
        assert_eq!(object["message"], "hi");
        assert!(object.get("$createdAt").is_none());
        assert_eq!(DocumentTransition::from_object(object).unwrap(), transition);
    }

    #[test]
    fn test_reserved_action_two_is_unknown() {
        assert_eq!(DocumentAction::try_from(2), Err(2));
        let value = json!({ "$action": 2, "$id": Identifier::default().to_value() });
        assert!(DocumentTransition::from_object(value).is_err());
    }

    #[test]
    fn test_replace_carries_forward_identity_fields() {
        let existing = Document {
            protocol_version: 1,
            id: Identifier::new([1; 32]),
            document_type: "note".into(),
            data_contract_id: Identifier::new([2; 32]),
            owner_id: Identifier::new([3; 32]),
            revision: 1,
            created_at: Some(10),
            updated_at: Some(10),
            data: data("old"),
        };
        let replace = DocumentReplaceTransition {
            id: existing.id,
            document_type: "note".into(),
            data_contract_id: existing.data_contract_id,
            revision: 2,
            created_at: None,
            updated_at: Some(20),
            data: data("new"),
        };
        let updated = replace.to_document(&existing);
        assert_eq!(updated.owner_id, existing.owner_id);
        assert_eq!(updated.created_at, Some(10));
        assert_eq!(updated.updated_at, Some(20));
        assert_eq!(updated.revision, 2);
        assert_eq!(updated.data, data("new"));
    }
}
