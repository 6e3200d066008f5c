//! # Asset Lock Proofs
//!
//! Evidence that a Layer-1 output was locked to fund an identity. Each
//! outpoint may be consumed exactly once.
//!
//! | Proof | Discriminant | Carries |
//! |-------|--------------|---------|
//! | Instant | 0 | Full transaction, output index, instant lock |
//! | Chain | 1 | Chain-locked height, outpoint |
//!
//! Layer-1 transactions and instant locks travel as bincode payloads.

use crate::domain::errors::PlatformError;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use shared_types::{sha256d, Hash, Identifier, PublicKeyHash};
use std::fmt;

/// Script opcode marking a data-carrying (unspendable) output.
pub const OP_RETURN: u8 = 0x6a;

/// Layer-1 transaction id: `sha256d` of the serialized transaction.
pub fn transaction_id(raw_transaction: &[u8]) -> Hash {
    sha256d(raw_transaction)
}

// =============================================================================
// OUTPOINT
// =============================================================================

/// Reference to one output of a Layer-1 transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: Hash,
    pub vout: u32,
}

impl OutPoint {
    /// Serialized size: txid followed by little-endian vout.
    pub const LENGTH: usize = 36;

    pub fn new(txid: Hash, vout: u32) -> Self {
        Self { txid, vout }
    }

    pub fn to_bytes(&self) -> [u8; 36] {
        let mut bytes = [0u8; 36];
        bytes[..32].copy_from_slice(&self.txid);
        bytes[32..].copy_from_slice(&self.vout.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::LENGTH {
            return None;
        }
        let mut txid = [0u8; 32];
        txid.copy_from_slice(&bytes[..32]);
        let mut vout = [0u8; 4];
        vout.copy_from_slice(&bytes[32..]);
        Some(Self {
            txid,
            vout: u32::from_le_bytes(vout),
        })
    }

    /// Identity id funded through this outpoint.
    pub fn identity_id(&self) -> Identifier {
        Identifier::new(sha256d(&self.to_bytes()))
    }
}

impl Serialize for OutPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

struct OutPointVisitor;

impl<'de> Visitor<'de> for OutPointVisitor {
    type Value = OutPoint;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("36 outpoint bytes")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<OutPoint, E> {
        OutPoint::from_bytes(v).ok_or_else(|| E::invalid_length(v.len(), &self))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<OutPoint, E> {
        self.visit_bytes(&v)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<OutPoint, A::Error> {
        let mut bytes = Vec::with_capacity(OutPoint::LENGTH);
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        self.visit_byte_buf(bytes)
    }
}

impl<'de> Deserialize<'de> for OutPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(OutPointVisitor)
        } else {
            deserializer.deserialize_bytes(OutPointVisitor)
        }
    }
}

// =============================================================================
// LAYER-1 PAYLOADS
// =============================================================================

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

/// Transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// Amount in duffs.
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

impl TxOut {
    /// Data-carrying output whose single push is `payload`.
    pub fn data_carrier(value: u64, payload: &[u8]) -> Self {
        let mut script_pubkey = Vec::with_capacity(payload.len() + 2);
        script_pubkey.push(OP_RETURN);
        script_pubkey.push(payload.len() as u8);
        script_pubkey.extend_from_slice(payload);
        Self {
            value,
            script_pubkey,
        }
    }

    /// Payload of an `OP_RETURN <push>` script, if this output is one.
    pub fn data_payload(&self) -> Option<&[u8]> {
        match self.script_pubkey.as_slice() {
            [OP_RETURN, len, payload @ ..] if *len as usize == payload.len() => Some(payload),
            _ => None,
        }
    }
}

/// Layer-1 transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer1Transaction {
    pub version: u16,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Layer1Transaction {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Quorum-signed lock over a transaction's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantLock {
    pub version: u8,
    pub inputs: Vec<OutPoint>,
    pub txid: Hash,
    pub cycle_hash: Hash,
    pub signature: Vec<u8>,
}

impl InstantLock {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// Request id the quorum signed: `sha256d("islock" ‖ inputs)`.
    pub fn request_id(&self) -> Hash {
        let mut preimage = b"islock".to_vec();
        for input in &self.inputs {
            preimage.extend_from_slice(&input.to_bytes());
        }
        sha256d(&preimage)
    }
}

/// Transaction as reported by the chain-state collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTransaction {
    pub data: Vec<u8>,
    pub height: Option<u32>,
    pub confirmations: u32,
    pub is_chain_locked: bool,
}

/// A verified locked output, attached as validation data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedOutput {
    pub out_point: OutPoint,
    /// Amount in duffs.
    pub value: u64,
    pub public_key_hash: PublicKeyHash,
}

// =============================================================================
// PROOFS
// =============================================================================

/// Proof discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AssetLockProofType {
    Instant = 0,
    Chain = 1,
}

impl TryFrom<u64> for AssetLockProofType {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Instant),
            1 => Ok(Self::Chain),
            other => Err(other),
        }
    }
}

/// Proof carrying the full transaction and its instant lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantAssetLockProof {
    pub transaction: Vec<u8>,
    pub output_index: u32,
    pub instant_lock: Vec<u8>,
}

impl InstantAssetLockProof {
    pub fn out_point(&self) -> OutPoint {
        OutPoint::new(transaction_id(&self.transaction), self.output_index)
    }
}

/// Proof referencing a chain-locked output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainAssetLockProof {
    pub core_chain_locked_height: u32,
    pub out_point: OutPoint,
}

/// Closed set of asset lock proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLockProof {
    Instant(InstantAssetLockProof),
    Chain(ChainAssetLockProof),
}

impl AssetLockProof {
    pub fn proof_type(&self) -> AssetLockProofType {
        match self {
            Self::Instant(_) => AssetLockProofType::Instant,
            Self::Chain(_) => AssetLockProofType::Chain,
        }
    }

    /// The outpoint this proof consumes.
    pub fn out_point(&self) -> OutPoint {
        match self {
            Self::Instant(proof) => proof.out_point(),
            Self::Chain(proof) => proof.out_point,
        }
    }

    /// Identity id derived from the consumed outpoint.
    pub fn create_identifier(&self) -> Identifier {
        self.out_point().identity_id()
    }

    /// Canonical wire object with its `type` discriminant.
    pub fn to_object(&self) -> Result<Value, PlatformError> {
        let body = match self {
            Self::Instant(proof) => serde_json::to_value(proof),
            Self::Chain(proof) => serde_json::to_value(proof),
        }
        .map_err(|e| decoding_error(e.to_string()))?;
        let mut object = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        object.insert("type".into(), Value::from(self.proof_type() as u8));
        Ok(Value::Object(object))
    }

    /// Decode a canonical wire object.
    pub fn from_object(mut value: Value) -> Result<Self, PlatformError> {
        let object = value
            .as_object_mut()
            .ok_or_else(|| decoding_error("expected an object".into()))?;
        let raw_type = object.remove("type").and_then(|t| t.as_u64());
        let proof_type = raw_type
            .ok_or_else(|| decoding_error("missing proof type".into()))
            .and_then(|t| {
                AssetLockProofType::try_from(t)
                    .map_err(|t| decoding_error(format!("unknown proof type {t}")))
            })?;
        match proof_type {
            AssetLockProofType::Instant => serde_json::from_value(value).map(Self::Instant),
            AssetLockProofType::Chain => serde_json::from_value(value).map(Self::Chain),
        }
        .map_err(|e| decoding_error(e.to_string()))
    }
}

fn decoding_error(message: String) -> PlatformError {
    PlatformError::Decoding {
        entity: "asset lock proof",
        message,
    }
}

impl Serialize for AssetLockProof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AssetLockProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_object(value).map_err(de::Error::custom)
    }
}
