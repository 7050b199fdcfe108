//! Credential shapes and their resolution from configuration.
//!
//! Two mutually exclusive strategies exist: static API-key headers, and the
//! legacy interactive login with username, password and passkey. When both
//! are configured the API-key pair always wins.

use std::fmt;

use crate::api::ApiError;
use crate::config::Config;

/// Static header credentials. Presence of both keys in the configuration
/// selects this strategy unconditionally.
#[derive(Clone)]
pub struct ApiKeyCredentials {
    pub user: String,
    pub key: String,
}

impl ApiKeyCredentials {
    pub fn from_config(config: &Config) -> Option<Self> {
        match (&config.api_user, &config.api_key) {
            (Some(user), Some(key)) => Some(Self {
                user: user.clone(),
                key: key.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("user", &self.user)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Per-call overrides layered over the configuration defaults for the
/// interactive login strategy.
#[derive(Clone, Debug, Default)]
pub struct CredentialOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub passkey: Option<String>,
}

/// Fully resolved interactive login credentials.
#[derive(Clone)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
    pub passkey: String,
}

impl PasswordCredentials {
    /// Resolves all three fields, overrides first, then configuration.
    /// Fails when any field is missing from both sources.
    pub fn resolve(config: &Config, overrides: &CredentialOverrides) -> Result<Self, ApiError> {
        let username = overrides.username.clone().or_else(|| config.username.clone());
        let password = overrides.password.clone().or_else(|| config.password.clone());
        let passkey = overrides.passkey.clone().or_else(|| config.passkey.clone());

        let mut missing = Vec::new();
        if username.is_none() {
            missing.push("username");
        }
        if password.is_none() {
            missing.push("password");
        }
        if passkey.is_none() {
            missing.push("passkey");
        }
        match (username, password, passkey) {
            (Some(username), Some(password), Some(passkey)) => Ok(Self {
                username,
                password,
                passkey,
            }),
            _ => Err(ApiError::Config(format!(
                "not enough credentials to log in (missing {})",
                missing.join(", ")
            ))),
        }
    }
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("passkey", &"[REDACTED]")
            .finish()
    }
}
