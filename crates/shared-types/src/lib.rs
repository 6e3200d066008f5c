//! # Shared Types Crate
//!
//! Value types shared by every platform crate: the 32-byte [`Identifier`],
//! its textual encodings, and the hashing primitives used for id derivation.
//!
//! ## Design Principles
//!
//! - **Byte Equality**: two identifiers are equal iff their bytes are equal.
//!   Base58, base64 and hex renderings are views, never distinct identities.
//! - **Canonical Wire Form**: binary values serialize as byte sequences; the
//!   textual encodings are only applied at interchange boundaries.

pub mod encoding;
pub mod errors;
pub mod hashing;
pub mod identifier;

pub use encoding::{decode_binary, encode_binary, Encoding};
pub use errors::*;
pub use hashing::{hash160, sha256, sha256d, Hash, PublicKeyHash};
pub use identifier::Identifier;
