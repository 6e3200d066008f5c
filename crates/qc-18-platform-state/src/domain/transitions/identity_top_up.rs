//! Add credits to an existing identity.

use crate::domain::asset_lock::AssetLockProof;
use serde::{Deserialize, Serialize};
use shared_types::Identifier;

/// Transition funding an identity from a further asset lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityTopUpTransition {
    pub protocol_version: u32,
    pub asset_lock_proof: AssetLockProof,
    pub identity_id: Identifier,
    #[serde(default)]
    pub signature: Vec<u8>,
}
