//! # Hashing Primitives
//!
//! Content addressing for contracts, documents, identities and Layer-1
//! transactions. Everything the platform derives an id from goes through
//! [`sha256d`]; public keys are indexed by [`hash160`].

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// A 32-byte hash (double SHA-256).
pub type Hash = [u8; 32];

/// A 20-byte public-key hash (RIPEMD-160 of SHA-256).
pub type PublicKeyHash = [u8; 20];

/// Single SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Double SHA-256, the platform's content-addressing hash.
pub fn sha256d(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// RIPEMD-160 over SHA-256.
pub fn hash160(data: &[u8]) -> PublicKeyHash {
    let first = Sha256::digest(data);
    Ripemd160::digest(first).into()
}
