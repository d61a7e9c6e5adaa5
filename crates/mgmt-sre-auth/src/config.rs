//! Credential configuration.
//!
//! Credentials come from one of three places:
//! - explicit construction ([`CredentialConfig::api_key`], [`CredentialConfig::bearer`])
//! - environment variables (`<SERVICE>_APIKEY`, `<SERVICE>_USERNAME`, ...)
//! - a TOML file with `api_key`, `username`, `password`, `auth_url` keys
//!
//! Whatever the source, [`CredentialConfig::resolve`] is the single point
//! where the API key / username-password modes are told apart.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Default service name used to derive environment variable names.
pub const DEFAULT_SERVICE_NAME: &str = "backup_recovery_management_sre_api";

/// Raw, unvalidated credential configuration.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialConfig {
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_url: Option<String>,
}

/// Validated credentials, one mode only.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Static API key sent as the `apiKey` header.
    ApiKey(String),
    /// Username/password exchanged for a bearer token.
    Password(PasswordCredentials),
}

/// Username/password pair and the endpoint that issues tokens for it.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
    pub auth_url: String,
}

impl CredentialConfig {
    /// Configuration for API key mode.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Default::default()
        }
    }

    /// Configuration for bearer token mode.
    pub fn bearer(
        username: impl Into<String>,
        password: impl Into<String>,
        auth_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: None,
            username: Some(username.into()),
            password: Some(password.into()),
            auth_url: Some(auth_url.into()),
        }
    }

    /// Load credentials from the process environment.
    pub fn from_env(service_name: &str) -> Self {
        Self::from_env_with(service_name, |name| std::env::var(name).ok())
    }

    /// Load credentials using a custom variable lookup.
    pub fn from_env_with<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| {
            lookup(&service_env_var(service_name, suffix)).filter(|v| !v.is_empty())
        };
        Self {
            api_key: get("APIKEY"),
            username: get("USERNAME"),
            password: get("PASSWORD"),
            auth_url: get("AUTH_URL"),
        }
    }

    /// Parse credentials from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AuthError::Configuration(format!("failed to parse credentials: {}", e)))
    }

    /// Load credentials from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuthError::Configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            AuthError::Configuration(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Fill any unset field from `other`.
    pub fn or(self, other: CredentialConfig) -> Self {
        Self {
            api_key: non_empty(self.api_key).or(other.api_key),
            username: non_empty(self.username).or(other.username),
            password: non_empty(self.password).or(other.password),
            auth_url: non_empty(self.auth_url).or(other.auth_url),
        }
    }

    /// Check that exactly one credential mode is usable. Performs no I/O.
    pub fn validate(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }

    /// Validate and pick the credential mode. An API key wins when both are set.
    pub fn resolve(&self) -> Result<Credentials> {
        if let Some(key) = field(&self.api_key) {
            return Ok(Credentials::ApiKey(key.to_string()));
        }

        let missing: Vec<&str> = [
            ("username", &self.username),
            ("password", &self.password),
            ("auth_url", &self.auth_url),
        ]
        .into_iter()
        .filter(|(_, value)| field(value).is_none())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(AuthError::Configuration(format!(
                "specify an api_key or all of username, password and auth_url (missing: {})",
                missing.join(", ")
            )));
        }

        Ok(Credentials::Password(PasswordCredentials {
            username: field(&self.username).unwrap_or_default().to_string(),
            password: field(&self.password).unwrap_or_default().to_string(),
            auth_url: field(&self.auth_url).unwrap_or_default().to_string(),
        }))
    }
}

/// Environment variable name for a service setting, e.g. `MY_SERVICE_APIKEY`.
pub fn service_env_var(service_name: &str, suffix: &str) -> String {
    format!("{}_{}", service_name.to_uppercase().replace('-', "_"), suffix)
}

fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn mask(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "****")
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("api_key", &mask(&self.api_key))
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .field("auth_url", &self.auth_url)
            .finish()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(****)"),
            Credentials::Password(p) => f.debug_tuple("Password").field(p).finish(),
        }
    }
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &"****")
            .field("auth_url", &self.auth_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_api_key_only_is_valid() {
        let config = CredentialConfig::api_key("key-1");
        assert_eq!(config.resolve().unwrap(), Credentials::ApiKey("key-1".into()));
    }

    #[test]
    fn test_password_triple_is_valid() {
        let config = CredentialConfig::bearer("u", "p", "https://auth.example/token");
        match config.resolve().unwrap() {
            Credentials::Password(p) => {
                assert_eq!(p.username, "u");
                assert_eq!(p.password, "p");
                assert_eq!(p.auth_url, "https://auth.example/token");
            }
            other => panic!("unexpected credentials: {:?}", other),
        }
    }

    #[test]
    fn test_empty_api_key_with_triple_is_valid() {
        let config = CredentialConfig {
            api_key: Some(String::new()),
            ..CredentialConfig::bearer("u", "p", "https://auth.example/token")
        };
        assert!(matches!(config.resolve().unwrap(), Credentials::Password(_)));
    }

    #[test]
    fn test_all_empty_is_rejected() {
        let err = CredentialConfig::default().validate().unwrap_err();
        assert!(err.is_configuration());
        let msg = err.to_string();
        assert!(msg.contains("username"));
        assert!(msg.contains("password"));
        assert!(msg.contains("auth_url"));
    }

    #[test]
    fn test_api_key_takes_precedence() {
        let config = CredentialConfig {
            api_key: Some("key-1".into()),
            username: Some("u".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve().unwrap(), Credentials::ApiKey("key-1".into()));
    }

    #[test]
    fn test_missing_field_is_named() {
        let config = CredentialConfig {
            username: Some("u".into()),
            password: Some(String::new()),
            auth_url: Some("https://auth.example/token".into()),
            ..Default::default()
        };
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("missing: password"));
    }

    #[test]
    fn test_from_env_with() {
        let vars: HashMap<&str, &str> = [
            ("MY_SERVICE_USERNAME", "admin"),
            ("MY_SERVICE_PASSWORD", "secret"),
            ("MY_SERVICE_AUTH_URL", "https://auth.example/token"),
            ("MY_SERVICE_APIKEY", ""),
        ]
        .into_iter()
        .collect();

        let config =
            CredentialConfig::from_env_with("my-service", |k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key, None);
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert!(matches!(config.resolve().unwrap(), Credentials::Password(_)));
    }

    #[test]
    fn test_service_env_var() {
        assert_eq!(
            service_env_var(DEFAULT_SERVICE_NAME, "APIKEY"),
            "BACKUP_RECOVERY_MANAGEMENT_SRE_API_APIKEY"
        );
    }

    #[test]
    fn test_from_toml_str() {
        let config = CredentialConfig::from_toml_str(
            r#"
            username = "u"
            password = "p"
            auth_url = "https://auth.example/token"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(CredentialConfig::from_toml_str("api_key = 12").is_err());
    }

    #[test]
    fn test_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("credentials.toml");
        std::fs::write(&path, "api_key = \"from-file\"\n").unwrap();

        let config = CredentialConfig::from_file(&path).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));

        let err = CredentialConfig::from_file(&temp.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_or_fills_unset_fields() {
        let explicit = CredentialConfig {
            username: Some("cli-user".into()),
            password: Some(String::new()),
            ..Default::default()
        };
        let merged = explicit.or(CredentialConfig::bearer("env-user", "env-pass", "https://a/t"));
        assert_eq!(merged.username.as_deref(), Some("cli-user"));
        assert_eq!(merged.password.as_deref(), Some("env-pass"));
        assert_eq!(merged.auth_url.as_deref(), Some("https://a/t"));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let config = CredentialConfig {
            api_key: Some("very-secret-key".into()),
            ..CredentialConfig::bearer("u", "hunter2", "https://a/t")
        };
        let out = format!("{:?}", config);
        assert!(!out.contains("very-secret-key"));
        assert!(!out.contains("hunter2"));
        assert!(out.contains("****"));

        let out = format!("{:?}", config.resolve().unwrap());
        assert!(!out.contains("very-secret-key"));
    }
}
