//! # Schemas
//!
//! Static schema documents and the pattern-compatibility engine. The
//! validator itself sits behind the [`SchemaValidator`](crate::ports::SchemaValidator)
//! port.

pub mod definitions;
pub mod pattern;

pub use definitions::SchemaKind;
pub use pattern::PatternEngine;
