//! # Binary Encodings
//!
//! Textual renderings of binary fields used at the interchange boundary.

use crate::errors::EncodingError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Supported textual encodings for binary values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Bitcoin alphabet base58 (default for identifiers).
    #[default]
    Base58,
    /// Standard padded base64 (default for other binary fields).
    Base64,
    /// Lowercase hex.
    Hex,
}

impl Encoding {
    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Base58 => "base58",
            Encoding::Base64 => "base64",
            Encoding::Hex => "hex",
        }
    }
}

/// Encode bytes into text.
pub fn encode_binary(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Base58 => bs58::encode(bytes).into_string(),
        Encoding::Base64 => STANDARD.encode(bytes),
        Encoding::Hex => hex::encode(bytes),
    }
}

/// Decode text into bytes.
pub fn decode_binary(text: &str, encoding: Encoding) -> Result<Vec<u8>, EncodingError> {
    let invalid = |message: String| EncodingError::InvalidString {
        encoding: encoding.name(),
        message,
    };

    match encoding {
        Encoding::Base58 => bs58::decode(text)
            .into_vec()
            .map_err(|e| invalid(e.to_string())),
        Encoding::Base64 => STANDARD.decode(text).map_err(|e| invalid(e.to_string())),
        Encoding::Hex => hex::decode(text).map_err(|e| invalid(e.to_string())),
    }
}
