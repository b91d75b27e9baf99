use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("progress fraction must be a finite value in [0, 1]")]
    InvalidFraction,
}

/// Fractional completion of a single piece of content, in `[0, 1]`.
///
/// `1.0` means the learner has fully completed the content.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ProgressFraction(f64);

impl ProgressFraction {
    /// Creates a validated progress fraction.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidFraction` if the value is NaN, infinite,
    /// or outside `[0, 1]`.
    pub fn new(value: f64) -> Result<Self, ProgressError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ProgressError::InvalidFraction);
        }
        Ok(Self(value))
    }

    /// A fraction of exactly zero.
    #[must_use]
    pub fn zero() -> Self {
        Self(0.0)
    }

    /// A fraction of exactly one.
    #[must_use]
    pub fn complete() -> Self {
        Self(1.0)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// True once the fraction has reached `1.0`.
    #[must_use]
    pub fn is_complete(self) -> bool {
        self.0 >= 1.0
    }
}

impl TryFrom<f64> for ProgressFraction {
    type Error = ProgressError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProgressFraction> for f64 {
    fn from(fraction: ProgressFraction) -> Self {
        fraction.0
    }
}

/// Question counts attached to a progress record, when the content is an
/// assessment-style resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMetadata {
    pub total_questions: Option<u32>,
    pub answered_questions: Option<u32>,
}
