//! # Domain Layer
//!
//! Entities, transitions and the consensus error model. Nothing in here
//! performs I/O.

pub mod asset_lock;
pub mod data_contract;
pub mod document;
pub mod errors;
pub mod identity;
pub mod transitions;
pub mod validation_result;

pub use asset_lock::*;
pub use data_contract::*;
pub use document::*;
pub use errors::*;
pub use identity::*;
pub use transitions::*;
pub use validation_result::ValidationResult;
