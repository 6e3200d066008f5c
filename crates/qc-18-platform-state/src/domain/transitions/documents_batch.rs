//! Ordered batch of document mutations submitted by one owner.

use super::document_transition::DocumentTransition;
use serde::{Deserialize, Serialize};
use shared_types::Identifier;

/// Transition carrying create/replace/delete sub-transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsBatchTransition {
    pub protocol_version: u32,
    pub owner_id: Identifier,
    pub transitions: Vec<DocumentTransition>,
    pub signature_public_key_id: u32,
    #[serde(default)]
    pub signature: Vec<u8>,
}

impl DocumentsBatchTransition {
    pub fn new(
        protocol_version: u32,
        owner_id: Identifier,
        transitions: Vec<DocumentTransition>,
        signature_public_key_id: u32,
    ) -> Self {
        Self {
            protocol_version,
            owner_id,
            transitions,
            signature_public_key_id,
            signature: Vec::new(),
        }
    }

    /// Contracts referenced by the batch, first occurrence order.
    pub fn data_contract_ids(&self) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = Vec::new();
        for transition in &self.transitions {
            let id = transition.data_contract_id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}
