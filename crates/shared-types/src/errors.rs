//! # Error Types
//!
//! Errors raised while converting values between their byte and textual forms.

use thiserror::Error;

/// Errors that can occur while decoding or constructing value types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Byte payload has the wrong size for the target type.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Text is not valid in the requested encoding.
    #[error("Invalid {encoding} string: {message}")]
    InvalidString {
        encoding: &'static str,
        message: String,
    },

    /// A JSON value could not be read as bytes.
    #[error("Expected a byte array or an encoded string, got {0}")]
    UnexpectedValue(String),
}
