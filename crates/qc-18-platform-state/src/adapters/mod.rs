//! # Adapters
//!
//! | Adapter | Port |
//! |---------|------|
//! | [`InMemoryStateRepository`] | [`StateRepository`](crate::ports::StateRepository) |
//! | [`JsonSchemaValidator`] | [`SchemaValidator`](crate::ports::SchemaValidator) |

pub mod json_schema;
pub mod memory_repository;

pub use json_schema::JsonSchemaValidator;
pub use memory_repository::InMemoryStateRepository;
