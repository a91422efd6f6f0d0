//! Account sign-up and sign-in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A signed-in account.
///
/// Only the identity fields are persisted locally; the id token lives in
/// memory for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(skip)]
    pub id_token: Option<String>,
}

/// Errors from an [`Authenticator`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account already exists for this email")]
    EmailExists,

    #[error("password is too weak")]
    WeakPassword,

    #[error("no account for this email")]
    UserNotFound,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Provider { message: String },
}

/// Identity provider used by the session actions.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Create an account and set its display name.
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Send a password reset email.
    async fn reset_password(&self, email: &str) -> Result<(), AuthError>;
}
