//! Create an identity funded by an asset lock.

use crate::domain::asset_lock::AssetLockProof;
use crate::domain::identity::IdentityPublicKey;
use serde::{Deserialize, Serialize};
use shared_types::Identifier;

/// Transition creating an identity.
///
/// Signed by the asset-lock key, so it carries no key reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCreateTransition {
    pub protocol_version: u32,
    pub asset_lock_proof: AssetLockProof,
    pub public_keys: Vec<IdentityPublicKey>,
    #[serde(default)]
    pub signature: Vec<u8>,
}

impl IdentityCreateTransition {
    /// Id of the identity this transition creates.
    pub fn identity_id(&self) -> Identifier {
        self.asset_lock_proof.create_identifier()
    }
}
