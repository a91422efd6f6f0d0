//! Email/password accounts via the Identity Toolkit REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gateway::{AuthError, AuthUser, Authenticator};

use super::client::{http_client, parse, send};
use super::config::FirebaseConfig;
use super::error::FirebaseError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

impl From<AccountResponse> for AuthUser {
    fn from(r: AccountResponse) -> Self {
        AuthUser {
            uid: r.local_id,
            email: r.email,
            display_name: r.display_name.filter(|n| !n.is_empty()),
            id_token: r.id_token,
        }
    }
}

/// Map an Identity Toolkit error code to an [`AuthError`].
///
/// Codes may carry a suffix, e.g. `WEAK_PASSWORD : Password should be ...`.
fn auth_error(message: String) -> AuthError {
    let code = message.split([' ', ':']).next().unwrap_or_default();
    match code {
        "EMAIL_EXISTS" => AuthError::EmailExists,
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            AuthError::InvalidCredentials
        }
        _ => AuthError::Provider { message },
    }
}

impl From<FirebaseError> for AuthError {
    fn from(err: FirebaseError) -> Self {
        match err {
            FirebaseError::Http(e) => AuthError::Http(e),
            FirebaseError::Api { message, .. } => auth_error(message),
            other => AuthError::Provider {
                message: other.to_string(),
            },
        }
    }
}

/// Firebase Authentication [`Authenticator`].
///
/// Sign-out is local only: the REST API holds no session to end.
#[derive(Debug, Clone)]
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FirebaseAuth {
    pub fn new(config: &FirebaseConfig) -> Result<Self, FirebaseError> {
        Ok(Self {
            http: http_client(config)?,
            base_url: config.auth_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn call<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, FirebaseError> {
        let url = format!("{}/accounts:{}", self.base_url, method);
        let response = send(
            self.http
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(body),
        )
        .await?;
        parse(&response)
    }
}

#[async_trait]
impl Authenticator for FirebaseAuth {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError> {
        let account: AccountResponse = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let mut user = AuthUser::from(account);
        if let Some(token) = user.id_token.as_deref() {
            let _: serde_json::Value = self
                .call(
                    "update",
                    &UpdateProfileRequest {
                        id_token: token,
                        display_name,
                        return_secure_token: false,
                    },
                )
                .await?;
        }
        user.display_name = Some(display_name.to_string());
        debug!(uid = %user.uid, "Registered account");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let account: AccountResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await
            .map_err(|e| match AuthError::from(e) {
                // Sign-in does not reveal which half was wrong.
                AuthError::UserNotFound => AuthError::InvalidCredentials,
                other => other,
            })?;
        Ok(account.into())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "PASSWORD_RESET",
                    email,
                },
            )
            .await?;
        Ok(())
    }
}
