//! # Validation Result
//!
//! Ordered, mergeable accumulator of consensus errors with an optional
//! side-channel data slot.

use super::errors::ConsensusError;

/// Outcome of a validation step.
///
/// Errors are append-only and keep insertion order. The result is valid
/// iff no error was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult<T = ()> {
    errors: Vec<ConsensusError>,
    data: Option<T>,
}

impl<T> Default for ValidationResult<T> {
    fn default() -> Self {
        Self {
            errors: Vec::new(),
            data: None,
        }
    }
}

impl<T> ValidationResult<T> {
    /// Empty, valid result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Result holding the given errors.
    pub fn with_errors(errors: Vec<ConsensusError>) -> Self {
        Self { errors, data: None }
    }

    /// Result holding a single error.
    pub fn with_error(error: ConsensusError) -> Self {
        Self::with_errors(vec![error])
    }

    /// Valid result carrying data.
    pub fn with_data(data: T) -> Self {
        Self {
            errors: Vec::new(),
            data: Some(data),
        }
    }

    /// Append one error.
    pub fn add_error(&mut self, error: ConsensusError) {
        self.errors.push(error);
    }

    /// Append several errors, keeping their order.
    pub fn add_errors(&mut self, errors: impl IntoIterator<Item = ConsensusError>) {
        self.errors.extend(errors);
    }

    /// Append every error of `other` after the current ones.
    ///
    /// The data slot of `other` is discarded.
    pub fn merge<U>(&mut self, other: ValidationResult<U>) {
        self.errors.extend(other.errors);
    }

    /// True iff no error has been recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Recorded errors in insertion order.
    pub fn errors(&self) -> &[ConsensusError] {
        &self.errors
    }

    /// First recorded error.
    pub fn first_error(&self) -> Option<&ConsensusError> {
        self.errors.first()
    }

    /// Consume into the error list.
    pub fn into_errors(self) -> Vec<ConsensusError> {
        self.errors
    }

    /// Store side-channel data.
    pub fn set_data(&mut self, data: T) {
        self.data = Some(data);
    }

    /// Borrow side-channel data.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Consume into the side-channel data.
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Re-type the data slot, keeping errors.
    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> ValidationResult<U> {
        ValidationResult {
            errors: self.errors,
            data: self.data.map(f),
        }
    }

    /// Drop the data slot, keeping errors.
    pub fn without_data(self) -> ValidationResult {
        ValidationResult {
            errors: self.errors,
            data: None,
        }
    }
}

impl<T> From<ConsensusError> for ValidationResult<T> {
    fn from(error: ConsensusError) -> Self {
        Self::with_error(error)
    }
}
