//! # Ports
//!
//! - [`inbound`]: the consensus API this crate exposes
//! - [`outbound`]: state and schema collaborators it depends on

pub mod inbound;
pub mod outbound;

pub use inbound::{PlatformStateApi, ProcessOutcome, ProcessingStage};
pub use outbound::{DocumentQuery, RepositoryError, SchemaValidator, StateRepository};
