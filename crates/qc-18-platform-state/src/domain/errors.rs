//! # Domain Errors
//!
//! Two disjoint channels:
//!
//! - [`ConsensusError`]: an expected, deterministic rule violation. Never
//!   returned through `Err`; always accumulated inside a `ValidationResult`.
//! - [`PlatformError`]: a caller contract violation or collaborator failure.
//!   Returned through `Err` immediately and never retried here.

use crate::ports::outbound::RepositoryError;
use shared_types::{Hash, Identifier};
use thiserror::Error;

/// A structured, enumerable consensus rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------
    /// Value does not conform to its JSON schema.
    #[error("JSON schema violation: {message}")]
    JsonSchema { message: String },

    /// Protocol version is newer than this node understands.
    #[error("Protocol version {version} is not supported (latest {latest})")]
    UnsupportedProtocolVersion { version: u32, latest: u32 },

    /// Protocol version is older than the minimum still accepted.
    #[error("Protocol version {version} is no longer compatible (minimum {minimum})")]
    IncompatibleProtocolVersion { version: u32, minimum: u32 },

    /// Raw input carries a missing or unknown transition discriminant.
    #[error("Invalid state transition type: {0:?}")]
    InvalidStateTransitionType(Option<u64>),

    // -------------------------------------------------------------------------
    // Data contract
    // -------------------------------------------------------------------------
    /// Declared contract id differs from the id derived from (owner, entropy).
    #[error("Invalid data contract id: expected {expected}, got {actual}")]
    InvalidDataContractId {
        expected: Identifier,
        actual: Identifier,
    },

    /// A document type schema is not itself a valid JSON schema.
    #[error("Invalid schema for document type '{document_type}': {message}")]
    InvalidDocumentSchema {
        document_type: String,
        message: String,
    },

    /// A `pattern` keyword does not compile under the linear-time dialect.
    #[error("Pattern '{pattern}' at {path} is not compatible: {message}")]
    IncompatibleRegexPattern {
        pattern: String,
        path: String,
        message: String,
    },

    /// A user-defined property uses the `$` prefix reserved for system fields.
    #[error("Property '{property}' of document type '{document_type}' uses a reserved name")]
    ReservedDocumentProperty {
        document_type: String,
        property: String,
    },

    /// An index references a property the document type does not define.
    #[error("Index '{index_name}' of '{document_type}' references undefined property '{property}'")]
    UndefinedIndexProperty {
        document_type: String,
        index_name: String,
        property: String,
    },

    /// An index references an object or array property.
    #[error("Index '{index_name}' of '{document_type}' cannot index '{property}' of type {property_type}")]
    InvalidIndexPropertyType {
        document_type: String,
        index_name: String,
        property: String,
        property_type: String,
    },

    /// Two index definitions of a type cover the same property list.
    #[error("Index '{index_name}' of '{document_type}' duplicates an earlier index")]
    DuplicateIndex {
        document_type: String,
        index_name: String,
    },

    /// A document type declares too many unique indices.
    #[error("Document type '{document_type}' exceeds the limit of {limit} unique indices")]
    UniqueIndicesLimitReached { document_type: String, limit: usize },

    /// Contract with this id is already stored.
    #[error("Data contract {0} is already present")]
    DataContractAlreadyPresent(Identifier),

    /// Referenced contract is not stored.
    #[error("Data contract {0} is not present")]
    DataContractNotPresent(Identifier),

    // -------------------------------------------------------------------------
    // Documents
    // -------------------------------------------------------------------------
    /// Batch carries more sub-transitions than allowed.
    #[error("Documents batch has {count} transitions, maximum is {max}")]
    MaxDocumentsTransitionsExceeded { count: usize, max: usize },

    /// Raw sub-transition carries a missing or unknown action discriminant.
    #[error("Invalid document transition action: {0:?}")]
    InvalidDocumentTransitionAction(Option<u64>),

    /// The same (type, id) appears more than once in one batch.
    #[error("Duplicate document transitions: {references:?}")]
    DuplicateDocumentTransitions { references: Vec<(String, Identifier)> },

    /// Create transition id differs from the id derived from its entropy.
    #[error("Invalid document transition id: expected {expected}, got {actual}")]
    InvalidDocumentTransitionId {
        expected: Identifier,
        actual: Identifier,
    },

    /// Contract does not define the referenced document type.
    #[error("Data contract {data_contract_id} does not define document type '{document_type}'")]
    InvalidDocumentType {
        document_type: String,
        data_contract_id: Identifier,
    },

    /// Create targets an id that is already stored.
    #[error("Document {0} is already present")]
    DocumentAlreadyPresent(Identifier),

    /// Replace or delete targets an id that is not stored.
    #[error("Document {0} was not found")]
    DocumentNotFound(Identifier),

    /// Replace tries to change the document's type or contract.
    #[error("Document {document_id} field '{field}' cannot change")]
    DocumentImmutableFieldMismatch {
        document_id: Identifier,
        field: String,
    },

    /// Submitter does not own the document ("update not allowed").
    #[error("Update not allowed: document {document_id} is owned by {document_owner_id}, not {submitter_id}")]
    DocumentOwnerIdMismatch {
        document_id: Identifier,
        document_owner_id: Identifier,
        submitter_id: Identifier,
    },

    /// Replace revision is not exactly previous + 1.
    #[error("Invalid revision for document {document_id}: expected {expected}, got {actual}")]
    InvalidDocumentRevision {
        document_id: Identifier,
        expected: u64,
        actual: u64,
    },

    /// A timestamp lies outside the allowed drift window around block time.
    #[error("Document {document_id} {timestamp_name} {timestamp} is outside [{window_start}, {window_end}]")]
    DocumentTimestampWindowViolation {
        document_id: Identifier,
        timestamp_name: String,
        timestamp: u64,
        window_start: u64,
        window_end: u64,
    },

    /// Create carries `$createdAt` and `$updatedAt` that differ.
    #[error("Document {0} $createdAt and $updatedAt must be equal on creation")]
    DocumentTimestampsMismatch(Identifier),

    /// A unique index collides with another document.
    #[error("Document {document_id} duplicates unique index '{index_name}' on {properties:?}")]
    DuplicateUniqueIndex {
        document_id: Identifier,
        index_name: String,
        properties: Vec<String>,
    },

    // -------------------------------------------------------------------------
    // Data triggers
    // -------------------------------------------------------------------------
    /// A trigger rejected the transition.
    #[error("Data trigger condition failed for document {document_id}: {message}")]
    DataTriggerCondition {
        data_contract_id: Identifier,
        document_id: Identifier,
        message: String,
    },

    /// A trigger failed while executing.
    #[error("Data trigger '{trigger}' failed for document {document_id}: {message}")]
    DataTriggerExecution {
        trigger: String,
        data_contract_id: Identifier,
        document_id: Identifier,
        message: String,
    },

    /// A trigger did not produce a structured result.
    #[error("Data trigger '{trigger}' returned an invalid result for document {document_id}")]
    DataTriggerInvalidResult {
        trigger: String,
        data_contract_id: Identifier,
        document_id: Identifier,
    },

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------
    /// Identity derived from the asset lock already exists.
    #[error("Identity {0} already exists")]
    IdentityAlreadyExists(Identifier),

    /// Top-up target does not exist.
    #[error("Identity {0} was not found")]
    IdentityNotFound(Identifier),

    /// Two declared keys share an id.
    #[error("Duplicated identity public key ids: {0:?}")]
    DuplicatedIdentityPublicKeyId(Vec<u32>),

    /// Two declared keys share key material.
    #[error("Duplicated identity public keys: {0:?}")]
    DuplicatedIdentityPublicKey(Vec<u32>),

    /// Key material is malformed for its declared type.
    #[error("Invalid data for identity public key {key_id}: {message}")]
    InvalidIdentityPublicKeyData { key_id: u32, message: String },

    /// Key is already registered to some identity.
    #[error("Identity public key with hash {} is already registered", hex::encode(.0))]
    IdentityPublicKeyAlreadyExists([u8; 20]),

    /// The asset lock's public-key hash matches none of the declared keys.
    #[error("Asset lock public key hash {} matches no declared key", hex::encode(.0))]
    AssetLockPublicKeyHashMismatch([u8; 20]),

    // -------------------------------------------------------------------------
    // Asset lock proofs
    // -------------------------------------------------------------------------
    /// Proof discriminant is missing or unknown.
    #[error("Unknown asset lock proof type: {0:?}")]
    UnknownAssetLockProofType(Option<u64>),

    /// Embedded transaction bytes do not parse.
    #[error("Invalid asset lock transaction: {0}")]
    InvalidAssetLockTransaction(String),

    /// Claimed output index is past the transaction's outputs.
    #[error("Asset lock output index {index} is out of range ({outputs} outputs)")]
    InvalidAssetLockOutputIndex { index: u32, outputs: usize },

    /// Claimed output is not a data-carrying output.
    #[error("Asset lock output {0} is not a data-carrying output")]
    InvalidAssetLockTransactionOutput(u32),

    /// Instant lock payload does not parse.
    #[error("Invalid instant asset lock: {0}")]
    InvalidInstantAssetLock(String),

    /// Instant lock references a different transaction.
    #[error("Instant lock references transaction {}, proof carries {}", hex::encode(.expected), hex::encode(.actual))]
    InstantLockTransactionIdMismatch { expected: Hash, actual: Hash },

    /// Instant lock signature does not verify.
    #[error("Instant asset lock signature is invalid")]
    InvalidInstantAssetLockSignature,

    /// Outpoint was already consumed by an identity.
    #[error("Asset lock outpoint {} was already used", hex::encode(.0))]
    AssetLockOutPointAlreadyUsed(Vec<u8>),

    /// Recovered public-key hash is not 20 bytes.
    #[error("Asset lock public key hash has {0} bytes, expected 20")]
    InvalidAssetLockPublicKeyHashLength(usize),

    /// Chain proof references a transaction the chain does not know.
    #[error("Asset lock transaction {} was not found", hex::encode(.0))]
    AssetLockTransactionNotFound(Hash),

    /// Chain proof references a transaction that is not final.
    #[error("Asset lock transaction {} is not finalized", hex::encode(.0))]
    AssetLockTransactionNotFinalized(Hash),

    /// Chain proof height is ahead of the platform's chain-locked height.
    #[error("Asset lock proof core height {proof_height} is ahead of platform height {platform_height}")]
    InvalidAssetLockProofCoreChainHeight {
        proof_height: u32,
        platform_height: u32,
    },
}

impl ConsensusError {
    /// Stable numeric code for wire responses.
    pub fn code(&self) -> u32 {
        match self {
            // Structure
            Self::JsonSchema { .. } => 1000,
            Self::UnsupportedProtocolVersion { .. } => 1001,
            Self::IncompatibleProtocolVersion { .. } => 1002,
            Self::InvalidStateTransitionType(_) => 1003,
            // Data contract
            Self::InvalidDataContractId { .. } => 1010,
            Self::InvalidDocumentSchema { .. } => 1011,
            Self::IncompatibleRegexPattern { .. } => 1012,
            Self::ReservedDocumentProperty { .. } => 1013,
            Self::UndefinedIndexProperty { .. } => 1014,
            Self::InvalidIndexPropertyType { .. } => 1015,
            Self::DuplicateIndex { .. } => 1016,
            Self::UniqueIndicesLimitReached { .. } => 1017,
            // Documents (structure)
            Self::MaxDocumentsTransitionsExceeded { .. } => 1020,
            Self::InvalidDocumentTransitionAction(_) => 1021,
            Self::DuplicateDocumentTransitions { .. } => 1022,
            Self::InvalidDocumentTransitionId { .. } => 1023,
            // Identity (structure)
            Self::DuplicatedIdentityPublicKeyId(_) => 1030,
            Self::DuplicatedIdentityPublicKey(_) => 1031,
            Self::InvalidIdentityPublicKeyData { .. } => 1032,
            // Asset lock proofs
            Self::UnknownAssetLockProofType(_) => 1040,
            Self::InvalidAssetLockTransaction(_) => 1041,
            Self::InvalidAssetLockOutputIndex { .. } => 1042,
            Self::InvalidAssetLockTransactionOutput(_) => 1043,
            Self::InvalidInstantAssetLock(_) => 1044,
            Self::InstantLockTransactionIdMismatch { .. } => 1045,
            Self::InvalidInstantAssetLockSignature => 1046,
            Self::AssetLockOutPointAlreadyUsed(_) => 1047,
            Self::InvalidAssetLockPublicKeyHashLength(_) => 1048,
            Self::AssetLockTransactionNotFound(_) => 1049,
            Self::AssetLockTransactionNotFinalized(_) => 1050,
            Self::InvalidAssetLockProofCoreChainHeight { .. } => 1051,
            // State
            Self::DataContractAlreadyPresent(_) => 4000,
            Self::DataContractNotPresent(_) => 4001,
            Self::InvalidDocumentType { .. } => 4002,
            Self::DocumentAlreadyPresent(_) => 4003,
            Self::DocumentNotFound(_) => 4004,
            Self::DocumentImmutableFieldMismatch { .. } => 4005,
            Self::DocumentOwnerIdMismatch { .. } => 4006,
            Self::InvalidDocumentRevision { .. } => 4007,
            Self::DocumentTimestampWindowViolation { .. } => 4008,
            Self::DocumentTimestampsMismatch(_) => 4009,
            Self::DuplicateUniqueIndex { .. } => 4010,
            Self::IdentityAlreadyExists(_) => 4020,
            Self::IdentityNotFound(_) => 4021,
            Self::IdentityPublicKeyAlreadyExists(_) => 4022,
            Self::AssetLockPublicKeyHashMismatch(_) => 4023,
            // Data triggers
            Self::DataTriggerCondition { .. } => 4030,
            Self::DataTriggerExecution { .. } => 4031,
            Self::DataTriggerInvalidResult { .. } => 4032,
        }
    }
}

/// Fatal error: the call cannot produce a consensus verdict.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// A typed factory saw a transition discriminant outside the closed set.
    #[error("Unknown state transition type: {0}")]
    UnknownStateTransitionType(u64),

    /// Input that passed structural validation failed to decode.
    #[error("Failed to decode {entity}: {message}")]
    Decoding {
        entity: &'static str,
        message: String,
    },

    /// A collaborator does not provide a capability this call needs.
    #[error("Missing collaborator capability: {0}")]
    MissingCapability(&'static str),

    /// A collaborator call failed.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    /// State changed between validation and apply.
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// A static schema failed to compile.
    #[error("Invalid static schema '{name}': {message}")]
    InvalidStaticSchema { name: &'static str, message: String },
}

impl From<RepositoryError> for PlatformError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Unsupported(capability) => Self::MissingCapability(capability),
            other => Self::Repository(other),
        }
    }
}
