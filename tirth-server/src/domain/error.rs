//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from gateway/IO errors.

/// Domain-level errors for validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Rating outside the 0-5 scale, or not a finite number
    #[error("invalid rating {0}: must be between 0 and 5")]
    InvalidRating(f64),

    /// Denomination string not recognised
    #[error("unknown denomination: {0}")]
    UnknownDenomination(String),

    /// A required text field was empty
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Preference value has the wrong type for its key
    #[error("preference {key} expects a {expected} value")]
    PreferenceType {
        key: &'static str,
        expected: &'static str,
    },
}
