//! Token credentials for Microsoft Entra ID authentication.
//!
//! The decoder never talks to an identity provider itself. It asks a
//! [`TokenCredential`] for a bearer token before each request and attaches
//! it. [`DefaultCredential`] is the ambient implementation used for
//! [`crate::AuthMode::AzureIdentity`]; tests and hosts with their own token
//! source inject a different implementation through
//! [`crate::DocIntelPdfDecoder::with_credential`].

use crate::error::DecodeError;
use async_trait::async_trait;
use azure_core::auth::TokenCredential as _;
use azure_identity::{DefaultAzureCredential, TokenCredentialOptions};
use std::fmt;
use std::time::SystemTime;
use tracing::debug;

/// OAuth scope for Cognitive Services data-plane calls.
pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

/// A bearer token and the moment it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: SystemTime,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: SystemTime) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Something that can produce a bearer token for the given scopes.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, DecodeError>;
}

/// The ambient Azure credential chain from `azure_identity`.
///
/// Source selection (environment service principal, managed identity,
/// Azure CLI) and per-scope token caching are left to
/// [`DefaultAzureCredential`].
pub struct DefaultCredential {
    inner: DefaultAzureCredential,
}

impl DefaultCredential {
    /// Build the chain from the process environment. Makes no network call.
    pub fn new() -> Result<Self, DecodeError> {
        let inner = DefaultAzureCredential::create(TokenCredentialOptions::default())
            .map_err(|e| DecodeError::Credential(format!("ambient credential: {e}")))?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl TokenCredential for DefaultCredential {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, DecodeError> {
        let token = self
            .inner
            .get_token(scopes)
            .await
            .map_err(|e| DecodeError::Credential(e.to_string()))?;
        debug!("Acquired token for {}", scopes.join(" "));
        Ok(AccessToken::new(token.token.secret(), SystemTime::from(token.expires_on)))
    }
}

impl fmt::Debug for DefaultCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCredential")
            .field("inner", &"DefaultAzureCredential")
            .finish()
    }
}
