//! Fixture builders for contracts, keys and asset locks.
//!
//! Enable with the `test-utils` feature flag.

use crate::config::LATEST_PROTOCOL_VERSION;
use crate::domain::{
    transaction_id, AssetLockProof, DataContract, IdentityCreateTransition, IdentityPublicKey,
    InstantAssetLockProof, InstantLock, KeyType, Layer1Transaction, OutPoint, TxIn, TxOut,
};
use serde_json::{json, Map, Value};
use shared_types::{hash160, Identifier, PublicKeyHash};

/// Compressed secp256k1 public key derived from a one-byte seed.
pub fn ecdsa_public_key(seed: u8) -> Vec<u8> {
    let mut secret = [0u8; 32];
    secret[31] = seed.max(1);
    let signing_key =
        k256::ecdsa::SigningKey::from_slice(&secret).expect("non-zero scalar is a valid key");
    signing_key
        .verifying_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec()
}

/// Compressed BLS12-381 public key derived from a one-byte seed.
pub fn bls_public_key(seed: u8) -> Vec<u8> {
    blst::min_pk::SecretKey::key_gen(&[seed; 32], &[])
        .expect("32 bytes of key material")
        .sk_to_pk()
        .compress()
        .to_vec()
}

/// Document types of the fixture contract.
///
/// - `note`: free-form message, no indices.
/// - `profile`: `handle` with a unique index and a restricted pattern.
pub fn note_documents() -> Map<String, Value> {
    let documents = json!({
        "note": {
            "type": "object",
            "properties": {
                "message": { "type": "string", "maxLength": 256 }
            },
            "required": ["message"],
            "additionalProperties": false
        },
        "profile": {
            "type": "object",
            "properties": {
                "handle": { "type": "string", "pattern": "^[a-z0-9]{3,20}$" },
                "bio": { "type": "string" }
            },
            "required": ["handle"],
            "indices": [
                { "name": "byHandle", "properties": [{ "handle": "asc" }], "unique": true }
            ],
            "additionalProperties": false
        }
    });
    documents.as_object().cloned().unwrap_or_default()
}

/// Fixture contract owned by `owner`.
pub fn note_contract(owner: Identifier) -> DataContract {
    DataContract::new(
        LATEST_PROTOCOL_VERSION,
        owner,
        &[0x42; 32],
        note_documents(),
        None,
    )
}

/// Name service contract: `domain` and `preorder` types.
pub fn dpns_contract(owner: Identifier) -> DataContract {
    let documents = json!({
        "domain": {
            "type": "object",
            "properties": {
                "label": { "type": "string", "pattern": "^[a-zA-Z0-9][a-zA-Z0-9-]{0,61}[a-zA-Z0-9]$" },
                "normalizedLabel": { "type": "string", "maxLength": 63 },
                "normalizedParentDomainName": { "type": "string", "maxLength": 190 },
                "preorderSalt": { "type": "array", "items": { "type": "integer" }, "minItems": 32, "maxItems": 32 },
                "records": {
                    "type": "object",
                    "properties": {
                        "dashUniqueIdentityId": { "type": "array", "items": { "type": "integer" }, "minItems": 32, "maxItems": 32 },
                        "dashAliasIdentityId": { "type": "array", "items": { "type": "integer" }, "minItems": 32, "maxItems": 32 }
                    },
                    "additionalProperties": false
                },
                "subdomainRules": {
                    "type": "object",
                    "properties": { "allowSubdomains": { "type": "boolean" } },
                    "additionalProperties": false
                }
            },
            "required": ["label", "normalizedLabel", "normalizedParentDomainName", "preorderSalt", "records", "subdomainRules"],
            "indices": [
                {
                    "name": "parentNameAndLabel",
                    "properties": [{ "normalizedParentDomainName": "asc" }, { "normalizedLabel": "asc" }],
                    "unique": true
                }
            ],
            "additionalProperties": false
        },
        "preorder": {
            "type": "object",
            "properties": {
                "saltedDomainHash": { "type": "array", "items": { "type": "integer" }, "minItems": 32, "maxItems": 32 }
            },
            "required": ["saltedDomainHash"],
            "indices": [
                { "name": "saltedHash", "properties": [{ "saltedDomainHash": "asc" }], "unique": true }
            ],
            "additionalProperties": false
        }
    });
    DataContract::new(
        LATEST_PROTOCOL_VERSION,
        owner,
        &[0xD0; 32],
        documents.as_object().cloned().unwrap_or_default(),
        None,
    )
}

/// Feature flag contract with a single `updateConsensusParams` type.
pub fn feature_flags_contract(owner: Identifier) -> DataContract {
    let documents = json!({
        "updateConsensusParams": {
            "type": "object",
            "properties": {
                "enableAtHeight": { "type": "integer", "minimum": 1 },
                "block": { "type": "object" }
            },
            "required": ["enableAtHeight"],
            "additionalProperties": false
        }
    });
    DataContract::new(
        LATEST_PROTOCOL_VERSION,
        owner,
        &[0xF0; 32],
        documents.as_object().cloned().unwrap_or_default(),
        None,
    )
}

/// Layer-1 transaction locking `duffs` to `public_key_hash` in output 0.
///
/// `nonce` varies the spent input so every call yields a distinct txid.
pub fn asset_lock_transaction(public_key_hash: PublicKeyHash, duffs: u64, nonce: u8) -> Layer1Transaction {
    Layer1Transaction {
        version: 3,
        inputs: vec![TxIn {
            previous_output: OutPoint::new([nonce; 32], 0),
            script_sig: vec![0x51],
            sequence: u32::MAX,
        }],
        outputs: vec![TxOut::data_carrier(duffs, &public_key_hash)],
        lock_time: 0,
    }
}

/// Instant lock over `transaction`.
pub fn instant_lock_for(transaction: &Layer1Transaction) -> InstantLock {
    let raw = transaction.to_bytes().expect("fixture transaction serializes");
    InstantLock {
        version: 1,
        inputs: transaction
            .inputs
            .iter()
            .map(|input| input.previous_output)
            .collect(),
        txid: transaction_id(&raw),
        cycle_hash: [0x11; 32],
        signature: vec![0x22; 96],
    }
}

/// Instant proof for a fresh asset lock.
pub fn instant_asset_lock_proof(
    public_key_hash: PublicKeyHash,
    duffs: u64,
    nonce: u8,
) -> InstantAssetLockProof {
    let transaction = asset_lock_transaction(public_key_hash, duffs, nonce);
    let instant_lock = instant_lock_for(&transaction);
    InstantAssetLockProof {
        transaction: transaction.to_bytes().expect("fixture transaction serializes"),
        output_index: 0,
        instant_lock: instant_lock.to_bytes().expect("fixture lock serializes"),
    }
}

/// Identity create transition with one ECDSA key funded by an instant lock.
pub fn identity_create_transition(key_seed: u8, duffs: u64, nonce: u8) -> IdentityCreateTransition {
    let key = IdentityPublicKey::new(0, KeyType::EcdsaSecp256k1, ecdsa_public_key(key_seed));
    let proof = instant_asset_lock_proof(hash160(&key.data), duffs, nonce);
    IdentityCreateTransition {
        protocol_version: LATEST_PROTOCOL_VERSION,
        asset_lock_proof: AssetLockProof::Instant(proof),
        public_keys: vec![key],
        signature: vec![0x33; 65],
    }
}
