//! Authenticator facade.
//!
//! [`Authenticator`] is selected once from a [`CredentialConfig`] and never
//! switches mode afterwards.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::bearer::BearerTokenAuthenticator;
use crate::config::{CredentialConfig, Credentials};
use crate::error::{AuthError, Result};

/// Authentication type reported by [`Authenticator::authentication_type`].
pub const AUTHENTICATION_TYPE: &str = "managementSreAuth";

/// Header carrying a static API key.
pub const API_KEY_HEADER: &str = "apikey";

/// Attach credentials to an outgoing request.
#[async_trait]
pub trait Authenticate: Send + Sync + std::fmt::Debug {
    /// Set exactly one credential header on `headers`.
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()>;

    /// Check the authenticator's configuration without any I/O.
    fn validate(&self) -> Result<()>;
}

// ============================================================================
// ApiKeyAuthenticator
// ============================================================================

/// Stateless authenticator that sends a static API key.
#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    api_key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let authenticator = Self {
            api_key: api_key.into(),
        };
        authenticator.validate()?;
        Ok(authenticator)
    }
}

impl std::fmt::Debug for ApiKeyAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuthenticator")
            .field("api_key", &"****")
            .finish()
    }
}

#[async_trait]
impl Authenticate for ApiKeyAuthenticator {
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        let mut value = HeaderValue::from_str(&self.api_key).map_err(|_| {
            AuthError::Authentication("API key is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(AuthError::Configuration("api_key must not be empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Authenticator
// ============================================================================

/// The authenticator a client uses to sign every request.
#[derive(Debug, Clone)]
pub enum Authenticator {
    ApiKey(ApiKeyAuthenticator),
    BearerToken(BearerTokenAuthenticator),
}

impl Authenticator {
    /// Validate `config` and build the matching authenticator.
    pub fn new(config: &CredentialConfig) -> Result<Self> {
        match config.resolve()? {
            Credentials::ApiKey(key) => Ok(Authenticator::ApiKey(ApiKeyAuthenticator::new(key)?)),
            Credentials::Password(credentials) => {
                tracing::debug!(username = %credentials.username, "Using bearer token authentication");
                Ok(Authenticator::BearerToken(BearerTokenAuthenticator::new(
                    credentials,
                )?))
            }
        }
    }

    pub fn authentication_type(&self) -> &'static str {
        AUTHENTICATION_TYPE
    }

    /// Short name of the credential mode, for display.
    pub fn mode(&self) -> &'static str {
        match self {
            Authenticator::ApiKey(_) => "api-key",
            Authenticator::BearerToken(_) => "bearer-token",
        }
    }

    pub fn as_bearer(&self) -> Option<&BearerTokenAuthenticator> {
        match self {
            Authenticator::BearerToken(bearer) => Some(bearer),
            Authenticator::ApiKey(_) => None,
        }
    }

    /// Decorate a built `reqwest` request.
    pub async fn authenticate_request(&self, request: &mut reqwest::Request) -> Result<()> {
        self.authenticate(request.headers_mut()).await
    }
}

impl From<ApiKeyAuthenticator> for Authenticator {
    fn from(authenticator: ApiKeyAuthenticator) -> Self {
        Authenticator::ApiKey(authenticator)
    }
}

impl From<BearerTokenAuthenticator> for Authenticator {
    fn from(authenticator: BearerTokenAuthenticator) -> Self {
        Authenticator::BearerToken(authenticator)
    }
}

#[async_trait]
impl Authenticate for Authenticator {
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        match self {
            Authenticator::ApiKey(inner) => inner.authenticate(headers).await,
            Authenticator::BearerToken(inner) => inner.authenticate(headers).await,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Authenticator::ApiKey(inner) => inner.validate(),
            Authenticator::BearerToken(inner) => inner.validate(),
        }
    }
}
