//! # qc-18-platform-state
//!
//! State transition consensus for platform data: data contracts, documents
//! and identities funded from Layer-1 asset locks.
//!
//! ## Pipeline
//!
//! ```text
//! raw wire object
//!       │
//!       ▼
//! [basic]  ── schema, protocol version, per-kind structural rules
//!       │
//!       ▼
//! [state]  ── repository lookups, asset lock proofs, timestamps
//!       │
//!       ▼
//! [data triggers] ── system contract rules (documents batches only)
//!       │
//!       ▼
//! [apply]  ── repository mutations
//! ```
//!
//! Every stage accumulates [`ConsensusError`]s into a [`ValidationResult`]
//! and halts the pipeline on rejection. Collaborator failures are
//! [`PlatformError`]s and abort immediately.
//!
//! ## Transitions
//!
//! | Type | Transition | Applies |
//! |------|------------|---------|
//! | 0 | DataContractCreate | new contract |
//! | 1 | DocumentsBatch | create / replace / delete documents |
//! | 2 | IdentityCreate | new identity, key hashes, consumed outpoint |
//! | 3 | IdentityTopUp | balance credit, consumed outpoint |
//!
//! ## Usage
//!
//! ```ignore
//! let service = PlatformStateService::initialize(repository, PlatformConfig::from_env()).await?;
//! match service.process(&raw).await? {
//!     ProcessOutcome::Applied(transition) => { /* ... */ }
//!     ProcessOutcome::Rejected { stage, errors } => { /* ... */ }
//! }
//! ```

pub mod adapters;
pub mod apply;
pub mod config;
pub mod domain;
pub mod ports;
pub mod schema;
pub mod service;
pub mod triggers;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{InMemoryStateRepository, JsonSchemaValidator};
pub use apply::apply_state_transition;
pub use config::{PlatformConfig, SystemContractBinding, LATEST_PROTOCOL_VERSION};
pub use domain::*;
pub use ports::*;
pub use schema::{PatternEngine, SchemaKind};
pub use service::{PlatformStateService, ServiceStats};
pub use triggers::{DataTrigger, DataTriggerContext, DataTriggerError, DataTriggerRegistry};
pub use validation::{validate_basic, validate_state, ValidationPipeline};
