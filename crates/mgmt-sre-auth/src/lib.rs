//! Credential layer for the backup-and-recovery management SRE API.
//!
//! Produces the header that signs every outgoing request, either a static
//! API key or a bearer token obtained by exchanging a username and password.
//!
//! # Components
//!
//! - [`config`]: credential configuration from code, environment or TOML
//! - [`token`]: the cached token record and its refresh threshold
//! - [`fetcher`]: the token endpoint exchange
//! - [`bearer`]: token cache, singleflight fetch and background refresh
//! - [`authenticator`]: the facade transports call once per request
//!
//! # Example
//!
//! ```no_run
//! use mgmt_sre_auth::{Authenticate, Authenticator, CredentialConfig};
//!
//! # async fn example() -> mgmt_sre_auth::Result<()> {
//! let config = CredentialConfig::bearer("admin", "secret", "https://auth.example/token");
//! let authenticator = Authenticator::new(&config)?;
//!
//! let mut headers = reqwest::header::HeaderMap::new();
//! authenticator.authenticate(&mut headers).await?;
//! # Ok(())
//! # }
//! ```

pub mod authenticator;
pub mod bearer;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod token;

pub use authenticator::{
    API_KEY_HEADER, AUTHENTICATION_TYPE, ApiKeyAuthenticator, Authenticate, Authenticator,
};
pub use bearer::{
    BearerTokenAuthenticator, BearerTokenAuthenticatorBuilder, REFRESH_GRACE_SECS,
    RefreshObserver, SyncFetchGuard,
};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{
    CredentialConfig, Credentials, DEFAULT_SERVICE_NAME, PasswordCredentials, service_env_var,
};
pub use error::{AuthError, Result};
pub use fetcher::{TOKEN_REQUEST_TIMEOUT, TokenFetcher};
pub use token::{TOKEN_LIFETIME_SECS, TokenInfo, TokenRecord};
