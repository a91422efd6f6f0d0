//! Firebase client error types.

use crate::gateway::GatewayError;

use super::convert::ConversionError;

/// Errors from the Firebase REST clients.
#[derive(Debug, thiserror::Error)]
pub enum FirebaseError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Stored document does not match the expected schema
    #[error("bad document {name}: {source}")]
    Conversion {
        name: String,
        #[source]
        source: ConversionError,
    },
}

impl FirebaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FirebaseError::Api { status: 404, .. })
    }
}

impl From<FirebaseError> for GatewayError {
    fn from(err: FirebaseError) -> Self {
        match err {
            FirebaseError::Http(e) => GatewayError::Http(e),
            FirebaseError::Api {
                status: 401 | 403, ..
            } => GatewayError::Unauthorized,
            FirebaseError::Api { message, .. } => GatewayError::Provider { message },
            e @ (FirebaseError::Json { .. } | FirebaseError::Conversion { .. }) => {
                GatewayError::Json {
                    message: e.to_string(),
                }
            }
        }
    }
}
