//! Authentication providers for the cloud mirror.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::RwLock;

use crate::util::SecretString;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Whether an identity provider is configured at all.
    fn is_enabled(&self) -> bool;

    fn is_signed_in(&self) -> bool;

    fn user_id(&self) -> Option<String>;

    async fn get_token(&self) -> Result<Option<SecretString>>;

    async fn sign_out(&self) -> Result<()>;
}

/// No identity provider. Cloud sync is unavailable; local work is unaffected.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAuth;

#[async_trait]
impl AuthProvider for DisabledAuth {
    fn is_enabled(&self) -> bool {
        false
    }

    fn is_signed_in(&self) -> bool {
        false
    }

    fn user_id(&self) -> Option<String> {
        None
    }

    async fn get_token(&self) -> Result<Option<SecretString>> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}

/// Static bearer token, typically read from an environment variable.
/// Signed in for as long as it holds a token.
pub struct TokenAuth {
    token: RwLock<Option<SecretString>>,
    user_id: Option<String>,
}

impl TokenAuth {
    pub fn new(token: SecretString, user_id: Option<String>) -> Self {
        Self {
            token: RwLock::new(Some(token).filter(|t| !t.is_empty())),
            user_id,
        }
    }

    /// `None` when `var` is unset or empty.
    pub fn from_env(var: &str, user_id: Option<String>) -> Option<Self> {
        let token = std::env::var(var).ok().filter(|t| !t.trim().is_empty())?;
        Some(Self::new(SecretString::new(token.trim().to_string()), user_id))
    }
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth")
            .field("signed_in", &self.is_signed_in())
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[async_trait]
impl AuthProvider for TokenAuth {
    fn is_enabled(&self) -> bool {
        true
    }

    fn is_signed_in(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    fn user_id(&self) -> Option<String> {
        if self.is_signed_in() {
            self.user_id.clone()
        } else {
            None
        }
    }

    async fn get_token(&self) -> Result<Option<SecretString>> {
        Ok(self.token.read().ok().and_then(|t| t.clone()))
    }

    async fn sign_out(&self) -> Result<()> {
        if let Ok(mut token) = self.token.write() {
            *token = None;
        }
        Ok(())
    }
}
