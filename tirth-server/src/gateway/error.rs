//! Gateway error types.

use crate::domain::DomainError;

/// Message for a missing site.
pub const SITE_NOT_FOUND: &str = "Tirth not found";
/// Message for a missing user record.
pub const USER_NOT_FOUND: &str = "User not found";
/// Message for a missing saved route.
pub const ROUTE_NOT_FOUND: &str = "Route not found";

/// Errors surfaced by a [`super::DataSource`].
///
/// Provider failures carry the provider's own message. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Requested document does not exist
    #[error("{0}")]
    NotFound(&'static str),

    /// The backing store rejected the request
    #[error("{message}")]
    Provider { message: String },

    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response or fixture body could not be decoded
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Credentials missing or rejected
    #[error("unauthorized: check FIREBASE_API_KEY and the signed-in user")]
    Unauthorized,

    /// Payload failed validation before reaching the store
    #[error("invalid input: {0}")]
    InvalidInput(#[from] DomainError),
}

impl GatewayError {
    pub fn provider(message: impl Into<String>) -> Self {
        GatewayError::Provider {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}
