//! # State Transitions
//!
//! Closed set of signed state mutations, tagged by an integer `type`:
//!
//! | Type | Variant | Signed by |
//! |------|---------|-----------|
//! | 0 | [`DataContractCreateTransition`] | Owner key (`signaturePublicKeyId`) |
//! | 1 | [`DocumentsBatchTransition`] | Owner key (`signaturePublicKeyId`) |
//! | 2 | [`IdentityCreateTransition`] | Asset-lock key |
//! | 3 | [`IdentityTopUpTransition`] | Asset-lock key |
//!
//! The canonical wire object carries every binary field as a byte array.
//! [`StateTransition::to_json`] renders identifiers as base58 and other
//! binary fields as base64; [`StateTransition::from_json`] reverses it.

pub mod data_contract_create;
pub mod document_transition;
pub mod documents_batch;
pub mod identity_create;
pub mod identity_top_up;
pub mod wire;

pub use data_contract_create::DataContractCreateTransition;
pub use document_transition::{
    DocumentAction, DocumentCreateTransition, DocumentDeleteTransition,
    DocumentReplaceTransition, DocumentTransition,
};
pub use documents_batch::DocumentsBatchTransition;
pub use identity_create::IdentityCreateTransition;
pub use identity_top_up::IdentityTopUpTransition;
pub use wire::BinaryField;

use crate::domain::errors::PlatformError;
use serde_json::{Map, Value};
use shared_types::{sha256d, Hash, Identifier};
use std::fmt;
use wire::{blob, identifier};

/// Transition discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateTransitionType {
    DataContractCreate = 0,
    DocumentsBatch = 1,
    IdentityCreate = 2,
    IdentityTopUp = 3,
}

impl StateTransitionType {
    /// Binary fields of this kind's wire object.
    pub fn binary_fields(self) -> &'static [BinaryField] {
        const DATA_CONTRACT_CREATE: &[BinaryField] = &[
            identifier("dataContract.$id"),
            identifier("dataContract.ownerId"),
            blob("entropy"),
            blob("signature"),
        ];
        const DOCUMENTS_BATCH: &[BinaryField] = &[
            identifier("ownerId"),
            identifier("transitions[].$id"),
            identifier("transitions[].$dataContractId"),
            blob("transitions[].$entropy"),
            blob("signature"),
        ];
        const IDENTITY_CREATE: &[BinaryField] = &[
            blob("assetLockProof.transaction"),
            blob("assetLockProof.instantLock"),
            blob("assetLockProof.outPoint"),
            blob("publicKeys[].data"),
            blob("signature"),
        ];
        const IDENTITY_TOP_UP: &[BinaryField] = &[
            identifier("identityId"),
            blob("assetLockProof.transaction"),
            blob("assetLockProof.instantLock"),
            blob("assetLockProof.outPoint"),
            blob("signature"),
        ];
        match self {
            Self::DataContractCreate => DATA_CONTRACT_CREATE,
            Self::DocumentsBatch => DOCUMENTS_BATCH,
            Self::IdentityCreate => IDENTITY_CREATE,
            Self::IdentityTopUp => IDENTITY_TOP_UP,
        }
    }
}

impl TryFrom<u64> for StateTransitionType {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::DataContractCreate),
            1 => Ok(Self::DocumentsBatch),
            2 => Ok(Self::IdentityCreate),
            3 => Ok(Self::IdentityTopUp),
            other => Err(other),
        }
    }
}

impl fmt::Display for StateTransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DataContractCreate => "DataContractCreate",
            Self::DocumentsBatch => "DocumentsBatch",
            Self::IdentityCreate => "IdentityCreate",
            Self::IdentityTopUp => "IdentityTopUp",
        };
        f.write_str(name)
    }
}

/// A decoded state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum StateTransition {
    DataContractCreate(DataContractCreateTransition),
    DocumentsBatch(DocumentsBatchTransition),
    IdentityCreate(IdentityCreateTransition),
    IdentityTopUp(IdentityTopUpTransition),
}

impl StateTransition {
    pub fn transition_type(&self) -> StateTransitionType {
        match self {
            Self::DataContractCreate(_) => StateTransitionType::DataContractCreate,
            Self::DocumentsBatch(_) => StateTransitionType::DocumentsBatch,
            Self::IdentityCreate(_) => StateTransitionType::IdentityCreate,
            Self::IdentityTopUp(_) => StateTransitionType::IdentityTopUp,
        }
    }

    pub fn protocol_version(&self) -> u32 {
        match self {
            Self::DataContractCreate(st) => st.protocol_version,
            Self::DocumentsBatch(st) => st.protocol_version,
            Self::IdentityCreate(st) => st.protocol_version,
            Self::IdentityTopUp(st) => st.protocol_version,
        }
    }

    pub fn signature(&self) -> &[u8] {
        match self {
            Self::DataContractCreate(st) => &st.signature,
            Self::DocumentsBatch(st) => &st.signature,
            Self::IdentityCreate(st) => &st.signature,
            Self::IdentityTopUp(st) => &st.signature,
        }
    }

    /// Owner key reference; identity transitions are signed by the
    /// asset-lock key instead.
    pub fn signature_public_key_id(&self) -> Option<u32> {
        match self {
            Self::DataContractCreate(st) => Some(st.signature_public_key_id),
            Self::DocumentsBatch(st) => Some(st.signature_public_key_id),
            Self::IdentityCreate(_) | Self::IdentityTopUp(_) => None,
        }
    }

    /// Identity on whose behalf the transition acts.
    pub fn owner_id(&self) -> Identifier {
        match self {
            Self::DataContractCreate(st) => st.data_contract.owner_id,
            Self::DocumentsBatch(st) => st.owner_id,
            Self::IdentityCreate(st) => st.identity_id(),
            Self::IdentityTopUp(st) => st.identity_id,
        }
    }

    /// Canonical wire object with byte-array binaries.
    pub fn to_object(&self) -> Result<Value, PlatformError> {
        let body = match self {
            Self::DataContractCreate(st) => serde_json::to_value(st),
            Self::DocumentsBatch(st) => serde_json::to_value(st),
            Self::IdentityCreate(st) => serde_json::to_value(st),
            Self::IdentityTopUp(st) => serde_json::to_value(st),
        }
        .map_err(|e| decoding_error(e.to_string()))?;
        let mut object = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        object.insert("type".into(), Value::from(self.transition_type() as u8));
        Ok(Value::Object(object))
    }

    /// Wire object with textual binaries.
    pub fn to_json(&self) -> Result<Value, PlatformError> {
        let mut value = self.to_object()?;
        wire::encode_binary_fields(&mut value, self.transition_type().binary_fields());
        Ok(value)
    }

    /// Decode a canonical wire object.
    ///
    /// An unknown `type` is fatal here: raw, untrusted input goes through
    /// basic validation, which reports it as a consensus error instead.
    pub fn from_object(mut value: Value) -> Result<Self, PlatformError> {
        let transition_type = Self::read_type(&value)?;
        if let Some(object) = value.as_object_mut() {
            object.remove("type");
        }
        match transition_type {
            StateTransitionType::DataContractCreate => {
                serde_json::from_value(value).map(Self::DataContractCreate)
            }
            StateTransitionType::DocumentsBatch => {
                serde_json::from_value(value).map(Self::DocumentsBatch)
            }
            StateTransitionType::IdentityCreate => {
                serde_json::from_value(value).map(Self::IdentityCreate)
            }
            StateTransitionType::IdentityTopUp => {
                serde_json::from_value(value).map(Self::IdentityTopUp)
            }
        }
        .map_err(|e| decoding_error(e.to_string()))
    }

    /// Decode a wire object whose binaries may be textual.
    pub fn from_json(mut value: Value) -> Result<Self, PlatformError> {
        let transition_type = Self::read_type(&value)?;
        wire::decode_text_fields(&mut value, transition_type.binary_fields());
        Self::from_object(value)
    }

    /// Bytes covered by the signature: the canonical object without its
    /// `signature` field.
    pub fn signable_bytes(&self) -> Result<Vec<u8>, PlatformError> {
        let mut value = self.to_object()?;
        if let Some(object) = value.as_object_mut() {
            object.remove("signature");
        }
        serde_json::to_vec(&value).map_err(|e| decoding_error(e.to_string()))
    }

    /// `sha256d` of the full canonical object.
    pub fn hash(&self) -> Result<Hash, PlatformError> {
        let bytes = serde_json::to_vec(&self.to_object()?)
            .map_err(|e| decoding_error(e.to_string()))?;
        Ok(sha256d(&bytes))
    }

    fn read_type(value: &Value) -> Result<StateTransitionType, PlatformError> {
        let raw = value
            .get("type")
            .and_then(Value::as_u64)
            .ok_or_else(|| decoding_error("missing transition type".into()))?;
        StateTransitionType::try_from(raw).map_err(PlatformError::UnknownStateTransitionType)
    }
}

fn decoding_error(message: String) -> PlatformError {
    PlatformError::Decoding {
        entity: "state transition",
        message,
    }
}
