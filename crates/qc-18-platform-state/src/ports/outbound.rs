//! # Driven Ports (SPI - Outbound)
//!
//! Everything the platform state core needs from the outside world:
//!
//! | Port | Provides |
//! |------|----------|
//! | [`StateRepository`] | Persistent contracts, documents, identities, chain-state lookups |
//! | [`SchemaValidator`] | Structural validation of canonical values against JSON schemas |
//!
//! Adapters implement these traits; the core never reaches storage or the
//! schema engine any other way.

use crate::domain::{
    DataContract, Document, FetchedTransaction, Identity, InstantLock, OutPoint, ValidationResult,
};
use crate::schema::SchemaKind;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{Hash, Identifier, PublicKeyHash};
use std::collections::HashMap;
use thiserror::Error;

// =============================================================================
// REPOSITORY ERRORS
// =============================================================================

/// Failure reported by a repository adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The adapter does not implement an optional capability.
    #[error("Capability not supported: {0}")]
    Unsupported(&'static str),

    /// Backend storage failure.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A stored record could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// DOCUMENT QUERIES
// =============================================================================

/// Equality filter over document fields.
///
/// Paths address system fields (`$ownerId`) or dotted data paths
/// (`records.dashUniqueIdentityId`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub where_clauses: Vec<(String, Value)>,
}

impl DocumentQuery {
    /// Query matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality clause.
    pub fn where_eq(mut self, path: impl Into<String>, value: Value) -> Self {
        self.where_clauses.push((path.into(), value));
        self
    }

    /// True if `document` satisfies every clause.
    pub fn matches(&self, document: &Document) -> bool {
        self.where_clauses
            .iter()
            .all(|(path, expected)| document.get(path).as_ref() == Some(expected))
    }
}

// =============================================================================
// STATE REPOSITORY
// =============================================================================

/// Persistent state and chain-state collaborator.
///
/// Every method is a suspension point. Optional capabilities default to
/// [`RepositoryError::Unsupported`], which the core surfaces as a fatal
/// missing-capability error.
#[async_trait]
pub trait StateRepository: Send + Sync {
    // ---- contracts ----------------------------------------------------------

    /// Fetch a stored data contract.
    async fn fetch_data_contract(
        &self,
        id: &Identifier,
    ) -> Result<Option<DataContract>, RepositoryError>;

    /// Store a new data contract.
    async fn store_data_contract(&self, contract: DataContract) -> Result<(), RepositoryError>;

    // ---- documents ----------------------------------------------------------

    /// Fetch documents of one (contract, type) matching `query`.
    async fn fetch_documents(
        &self,
        contract_id: &Identifier,
        document_type: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, RepositoryError>;

    /// Insert or overwrite a document.
    async fn store_document(&self, document: Document) -> Result<(), RepositoryError>;

    /// Remove a document.
    async fn remove_document(
        &self,
        contract_id: &Identifier,
        document_type: &str,
        id: &Identifier,
    ) -> Result<(), RepositoryError>;

    // ---- identities ---------------------------------------------------------

    /// Fetch a stored identity.
    async fn fetch_identity(&self, id: &Identifier) -> Result<Option<Identity>, RepositoryError>;

    /// Insert or overwrite an identity.
    async fn store_identity(&self, identity: Identity) -> Result<(), RepositoryError>;

    /// Resolve owners of public-key hashes. Unknown hashes are absent from
    /// the returned map.
    async fn fetch_identity_ids_by_public_key_hashes(
        &self,
        hashes: &[PublicKeyHash],
    ) -> Result<HashMap<PublicKeyHash, Identifier>, RepositoryError>;

    /// Index public-key hashes to their owning identity.
    async fn store_identity_public_key_hashes(
        &self,
        identity_id: &Identifier,
        hashes: &[PublicKeyHash],
    ) -> Result<(), RepositoryError>;

    // ---- chain state --------------------------------------------------------

    /// Fetch a Layer-1 transaction by id.
    async fn fetch_transaction(
        &self,
        txid: &Hash,
    ) -> Result<Option<FetchedTransaction>, RepositoryError>;

    /// Verify an instant lock signature against the active quorum.
    async fn verify_instant_lock(&self, _lock: &InstantLock) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unsupported("verify_instant_lock"))
    }

    /// True if the outpoint already funded an identity.
    async fn is_asset_lock_transaction_out_point_already_used(
        &self,
        out_point: &OutPoint,
    ) -> Result<bool, RepositoryError>;

    /// Record the outpoint as consumed.
    async fn mark_asset_lock_transaction_out_point_as_used(
        &self,
        out_point: &OutPoint,
    ) -> Result<(), RepositoryError>;

    /// Time of the latest platform block, in milliseconds.
    async fn fetch_latest_platform_block_time(&self) -> Result<u64, RepositoryError>;

    /// Height of the latest platform block.
    async fn fetch_latest_platform_block_height(&self) -> Result<u64, RepositoryError>;

    /// Core chain height the platform last saw chain-locked.
    async fn fetch_latest_platform_core_chain_locked_height(
        &self,
    ) -> Result<u32, RepositoryError> {
        Err(RepositoryError::Unsupported(
            "fetch_latest_platform_core_chain_locked_height",
        ))
    }
}

// =============================================================================
// SCHEMA VALIDATION
// =============================================================================

/// Structural validator over canonical values.
pub trait SchemaValidator: Send + Sync {
    /// Validate against one of the built-in schemas.
    fn validate_static(&self, kind: SchemaKind, instance: &Value) -> ValidationResult;

    /// Validate against an ad-hoc schema. A schema that does not compile
    /// is reported as a schema error.
    fn validate(&self, schema: &Value, instance: &Value) -> ValidationResult;

    /// Check that `schema` compiles, returning the compiler diagnostic.
    fn check_schema(&self, schema: &Value) -> Result<(), String>;

    /// Validate a document object against its contract's merged type schema.
    fn validate_document(
        &self,
        contract: &DataContract,
        document_type: &str,
        document: &Value,
    ) -> ValidationResult {
        match contract.document_json_schema(document_type) {
            Some(schema) => self.validate(&schema, document),
            None => ValidationResult::with_error(
                crate::domain::ConsensusError::InvalidDocumentType {
                    document_type: document_type.to_string(),
                    data_contract_id: contract.id,
                },
            ),
        }
    }
}
