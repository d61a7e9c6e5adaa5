//! CLI command handlers.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use mgmt_sre_auth::{Authenticator, CredentialConfig};
use mgmt_sre_client::SreClient;

pub mod get;
pub mod token;
pub mod validate;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Service name for `<SERVICE>_*` environment variables.
    pub service_name: String,
    /// Optional credentials file.
    pub config_path: Option<PathBuf>,
    /// Service URL override.
    pub url: Option<String>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Credentials from the config file, falling back to the environment.
    pub fn credentials(&self) -> Result<CredentialConfig> {
        let env = CredentialConfig::from_env(&self.service_name);
        match &self.config_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading credentials from file");
                Ok(CredentialConfig::from_file(path)?.or(env))
            }
            None => Ok(env),
        }
    }

    pub fn authenticator(&self) -> Result<Authenticator> {
        let credentials = self.credentials()?;
        Authenticator::new(&credentials).context("invalid credentials")
    }

    pub fn client(&self) -> Result<SreClient> {
        let mut builder = SreClient::builder().authenticator(self.authenticator()?);
        let url = self.url.clone().or_else(|| {
            std::env::var(mgmt_sre_auth::service_env_var(&self.service_name, "URL")).ok()
        });
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            builder = builder.base_url(url);
        }
        Ok(builder.build()?)
    }
}
