//! # Identifier
//!
//! Content-addressed 32-byte identifier for contracts, documents and
//! identities.

use crate::encoding::{decode_binary, encode_binary, Encoding};
use crate::errors::EncodingError;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A 32-byte identifier.
///
/// Serializes as a byte sequence. Human-readable deserializers additionally
/// accept a base58 string.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier([u8; 32]);

impl Identifier {
    /// Identifier size in bytes.
    pub const LENGTH: usize = 32;

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build from a slice that must be exactly 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| EncodingError::InvalidLength {
                expected: Self::LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Copy out the raw bytes.
    pub fn to_buffer(&self) -> [u8; 32] {
        self.0
    }

    /// Render in the given encoding.
    pub fn encode(&self, encoding: Encoding) -> String {
        encode_binary(&self.0, encoding)
    }

    /// Parse from the given encoding.
    pub fn decode(text: &str, encoding: Encoding) -> Result<Self, EncodingError> {
        let bytes = decode_binary(text, encoding)?;
        Self::from_bytes(&bytes)
    }

    /// Base58 rendering.
    pub fn to_base58(&self) -> String {
        self.encode(Encoding::Base58)
    }

    /// Canonical JSON form: an array of byte values.
    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(|b| Value::from(*b)).collect())
    }

    /// Read from a canonical byte array or a base58 string.
    pub fn from_value(value: &Value) -> Result<Self, EncodingError> {
        match value {
            Value::String(text) => Self::decode(text, Encoding::Base58),
            Value::Array(items) => {
                let bytes = items
                    .iter()
                    .map(|item| {
                        item.as_u64()
                            .and_then(|n| u8::try_from(n).ok())
                            .ok_or_else(|| EncodingError::UnexpectedValue(item.to_string()))
                    })
                    .collect::<Result<Vec<u8>, _>>()?;
                Self::from_bytes(&bytes)
            }
            other => Err(EncodingError::UnexpectedValue(other.to_string())),
        }
    }
}

impl From<[u8; 32]> for Identifier {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s, Encoding::Base58)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.to_base58())
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

struct IdentifierVisitor;

impl<'de> Visitor<'de> for IdentifierVisitor {
    type Value = Identifier;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("32 bytes or a base58 string")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Identifier, E> {
        Identifier::from_bytes(v).map_err(E::custom)
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Identifier, E> {
        self.visit_bytes(&v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Identifier, E> {
        Identifier::decode(v, Encoding::Base58).map_err(E::custom)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Identifier, A::Error> {
        let mut bytes = Vec::with_capacity(Identifier::LENGTH);
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        Identifier::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(IdentifierVisitor)
        } else {
            deserializer.deserialize_bytes(IdentifierVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Identifier {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (i * 7) as u8;
        }
        Identifier::new(bytes)
    }

    #[test]
    fn test_encodings_round_trip() {
        let id = sample();
        for encoding in [Encoding::Base58, Encoding::Base64, Encoding::Hex] {
            let text = id.encode(encoding);
            assert_eq!(Identifier::decode(&text, encoding).unwrap(), id);
        }
    }

    #[test]
    fn test_encodings_are_views_of_the_same_identity() {
        let id = sample();
        let via_base58 = Identifier::decode(&id.encode(Encoding::Base58), Encoding::Base58).unwrap();
        let via_base64 = Identifier::decode(&id.encode(Encoding::Base64), Encoding::Base64).unwrap();
        assert_eq!(via_base58, via_base64);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = Identifier::from_bytes(&[1u8; 31]).unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidLength {
                expected: 32,
                actual: 31
            }
        );
    }

    #[test]
    fn test_json_serializes_as_byte_array() {
        let id = sample();
        let value = serde_json::to_value(id).unwrap();
        assert_eq!(value, id.to_value());
        let back: Identifier = serde_json::from_value(value).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_json_accepts_base58_string() {
        let id = sample();
        let back: Identifier = serde_json::from_value(Value::String(id.to_base58())).unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_string().parse::<Identifier>().unwrap(), id);
    }

    #[test]
    fn test_bincode_round_trip() {
        let id = sample();
        let bytes = bincode::serialize(&id).unwrap();
        let back: Identifier = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_from_value_rejects_out_of_range_bytes() {
        let value = Value::Array(vec![Value::from(256); 32]);
        assert!(Identifier::from_value(&value).is_err());
    }
}
