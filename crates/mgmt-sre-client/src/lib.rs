//! HTTP client for the backup-and-recovery management SRE API.
//!
//! Wraps `reqwest` with base URL resolution, error mapping and request
//! signing through [`mgmt_sre_auth::Authenticator`].
//!
//! # Example
//!
//! ```no_run
//! use mgmt_sre_client::{Result, SreClient};
//!
//! # async fn example() -> Result<()> {
//! // Reads BACKUP_RECOVERY_MANAGEMENT_SRE_API_{APIKEY,USERNAME,PASSWORD,AUTH_URL,URL}
//! let client = SreClient::from_default_env()?;
//!
//! let alerts: serde_json::Value = client.get("alerts").await?;
//! println!("{}", alerts);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;

pub use client::{ClientBuilder, DEFAULT_SERVICE_URL, SreClient};
pub use error::{Error, Result};
pub use mgmt_sre_auth::{Authenticator, CredentialConfig, DEFAULT_SERVICE_NAME};
