//! Publish a new data contract.

use crate::domain::data_contract::{generate_entropy, DataContract};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_types::Identifier;

/// Transition creating a data contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataContractCreateTransition {
    pub protocol_version: u32,
    pub data_contract: DataContract,
    /// Entropy the contract id was derived from.
    pub entropy: [u8; 32],
    pub signature_public_key_id: u32,
    #[serde(default)]
    pub signature: Vec<u8>,
}

impl DataContractCreateTransition {
    /// Build an unsigned transition for a fresh contract with random entropy.
    pub fn new(
        protocol_version: u32,
        owner_id: Identifier,
        documents: Map<String, Value>,
        signature_public_key_id: u32,
    ) -> Self {
        let entropy = generate_entropy();
        Self {
            protocol_version,
            data_contract: DataContract::new(protocol_version, owner_id, &entropy, documents, None),
            entropy,
            signature_public_key_id,
            signature: Vec::new(),
        }
    }
}
