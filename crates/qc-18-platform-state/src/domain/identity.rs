//! # Identity
//!
//! An identity owns public keys and a credit balance funded from Layer-1
//! asset locks.
//!
//! | Key type | Discriminant | Data |
//! |----------|--------------|------|
//! | ECDSA secp256k1 | 0 | 33-byte compressed point |
//! | BLS12-381 | 1 | 48-byte compressed G1 point |
//! | ECDSA hash160 | 2 | 20-byte public-key hash |

use serde::{Deserialize, Serialize};
use shared_types::{hash160, Identifier, PublicKeyHash};

/// Credits granted per locked duff.
pub const CREDITS_PER_DUFF: u64 = 1000;

/// Convert a locked Layer-1 amount to platform credits.
pub fn convert_duffs_to_credits(duffs: u64) -> u64 {
    duffs.saturating_mul(CREDITS_PER_DUFF)
}

/// Public key algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum KeyType {
    EcdsaSecp256k1 = 0,
    Bls12_381 = 1,
    EcdsaHash160 = 2,
}

impl KeyType {
    /// Exact key data length for this algorithm.
    pub fn data_length(self) -> usize {
        match self {
            Self::EcdsaSecp256k1 => 33,
            Self::Bls12_381 => 48,
            Self::EcdsaHash160 => 20,
        }
    }
}

impl TryFrom<u8> for KeyType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::EcdsaSecp256k1),
            1 => Ok(Self::Bls12_381),
            2 => Ok(Self::EcdsaHash160),
            other => Err(format!("unknown key type {other}")),
        }
    }
}

impl From<KeyType> for u8 {
    fn from(value: KeyType) -> Self {
        value as u8
    }
}

/// A public key attached to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPublicKey {
    pub id: u32,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub data: Vec<u8>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl IdentityPublicKey {
    /// Enabled key of the given type.
    pub fn new(id: u32, key_type: KeyType, data: Vec<u8>) -> Self {
        Self {
            id,
            key_type,
            data,
            enabled: true,
        }
    }

    /// The 20-byte hash used for global key uniqueness and asset-lock
    /// matching. Hash160 keys already are that hash.
    pub fn hash(&self) -> Result<PublicKeyHash, String> {
        match self.key_type {
            KeyType::EcdsaHash160 => self.data.as_slice().try_into().map_err(|_| {
                format!("hash160 key must be 20 bytes, got {}", self.data.len())
            }),
            KeyType::EcdsaSecp256k1 | KeyType::Bls12_381 => Ok(hash160(&self.data)),
        }
    }

    /// Check the key material decodes for its declared algorithm.
    pub fn validate_data(&self) -> Result<(), String> {
        let expected = self.key_type.data_length();
        if self.data.len() != expected {
            return Err(format!(
                "expected {expected} bytes, got {}",
                self.data.len()
            ));
        }
        match self.key_type {
            KeyType::EcdsaSecp256k1 if !matches!(self.data[0], 0x02 | 0x03) => {
                Err(format!("not a compressed point: tag {:#04x}", self.data[0]))
            }
            KeyType::EcdsaSecp256k1 => k256::ecdsa::VerifyingKey::from_sec1_bytes(&self.data)
                .map(|_| ())
                .map_err(|_| "not a valid secp256k1 point".to_string()),
            KeyType::Bls12_381 => blst::min_pk::PublicKey::key_validate(&self.data)
                .map(|_| ())
                .map_err(|e| format!("not a valid BLS12-381 key: {e:?}")),
            KeyType::EcdsaHash160 => Ok(()),
        }
    }
}

/// Identity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum IdentityType {
    #[default]
    User = 0,
    Application = 1,
}

impl TryFrom<u8> for IdentityType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::User),
            1 => Ok(Self::Application),
            other => Err(format!("unknown identity type {other}")),
        }
    }
}

impl From<IdentityType> for u8 {
    fn from(value: IdentityType) -> Self {
        value as u8
    }
}

/// A stored identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub protocol_version: u32,
    pub id: Identifier,
    #[serde(rename = "type")]
    pub identity_type: IdentityType,
    pub public_keys: Vec<IdentityPublicKey>,
    pub balance: u64,
    pub revision: u64,
}

impl Identity {
    /// Fresh identity with an initial balance.
    pub fn new(
        protocol_version: u32,
        id: Identifier,
        public_keys: Vec<IdentityPublicKey>,
        balance: u64,
    ) -> Self {
        Self {
            protocol_version,
            id,
            identity_type: IdentityType::User,
            public_keys,
            balance,
            revision: 0,
        }
    }

    /// Look up a key by id.
    pub fn public_key(&self, id: u32) -> Option<&IdentityPublicKey> {
        self.public_keys.iter().find(|key| key.id == id)
    }

    /// Hashes of every key, skipping malformed ones.
    pub fn public_key_hashes(&self) -> Vec<PublicKeyHash> {
        self.public_keys
            .iter()
            .filter_map(|key| key.hash().ok())
            .collect()
    }

    /// Add credits to the balance.
    pub fn credit(&mut self, credits: u64) {
        self.balance = self.balance.saturating_add(credits);
    }
}
