//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use mgmt_sre_auth::{Authenticator, CredentialConfig, DEFAULT_SERVICE_NAME, service_env_var};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use url::Url;

use crate::error::{Error, ErrorResponse, Result};

/// Default URL to make service requests to.
pub const DEFAULT_SERVICE_URL: &str = "https://management-sre-api.cloud.ibm.com/v2";

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Management SRE API client.
///
/// Every request is signed by the configured [`Authenticator`] before it is
/// sent. Clones share the HTTP connection pool and the token cache.
///
/// # Example
///
/// ```no_run
/// use mgmt_sre_auth::{Authenticator, CredentialConfig};
/// use mgmt_sre_client::SreClient;
///
/// # async fn example() -> mgmt_sre_client::Result<()> {
/// let authenticator = Authenticator::new(&CredentialConfig::api_key("secret"))?;
/// let client = SreClient::builder()
///     .authenticator(authenticator)
///     .build()?;
///
/// let alerts: serde_json::Value = client.get("alerts").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SreClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
#[derive(Debug)]
struct ClientInner {
    /// HTTP client.
    http: reqwest::Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Signs every outgoing request.
    authenticator: Authenticator,
    /// Request timeout.
    timeout: Duration,
}

impl SreClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client from `<SERVICE>_*` environment variables.
    pub fn from_env(service_name: &str) -> Result<Self> {
        Self::from_env_with(service_name, |name| std::env::var(name).ok())
    }

    /// Build a client using a custom variable lookup.
    pub fn from_env_with<F>(service_name: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(&service_env_var(service_name, "URL")).filter(|v| !v.is_empty());
        let credentials = CredentialConfig::from_env_with(service_name, lookup);
        let authenticator = Authenticator::new(&credentials)?;

        let mut builder = Self::builder().authenticator(authenticator);
        if let Some(url) = url {
            builder = builder.base_url(url);
        }
        builder.build()
    }

    /// Build a client from the default service name's environment variables.
    pub fn from_default_env() -> Result<Self> {
        Self::from_env(DEFAULT_SERVICE_NAME)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get the authenticator.
    pub fn authenticator(&self) -> &Authenticator {
        &self.inner.authenticator
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path, relative to the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner.base_url.join(path).map_err(Error::from)
    }

    /// Make a GET request.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.inner.http.get(self.url(path)?);
        let response = self.execute(request).await?;
        self.handle_response(response).await
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let request = self.inner.http.get(self.url(path)?).query(query);
        let response = self.execute(request).await?;
        self.handle_response(response).await
    }

    /// Make a POST request.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let request = self.inner.http.post(self.url(path)?).json(body);
        let response = self.execute(request).await?;
        self.handle_response(response).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.inner.http.delete(self.url(path)?);
        let response = self.execute(request).await?;

        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }

        Ok(())
    }

    /// Sign and send a request. Nothing is sent if signing fails.
    pub async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let mut request = request.timeout(self.inner.timeout).build()?;
        self.inner
            .authenticator
            .authenticate_request(&mut request)
            .await?;

        tracing::debug!(method = %request.method(), url = %request.url(), "Sending request");
        Ok(self.inner.http.execute(request).await?)
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();

        match response.json::<ErrorResponse>().await {
            Ok(err) => {
                if status == 404 {
                    Error::NotFound(err.message)
                } else if status == 401 {
                    Error::Auth(err.message)
                } else {
                    Error::Api {
                        status,
                        code: err.code.unwrap_or_else(|| "unknown".to_string()),
                        message: err.message,
                    }
                }
            }
            Err(_) => Error::Api {
                status,
                code: "unknown".to_string(),
                message: format!("HTTP {}", status),
            },
        }
    }
}

/// Builder for creating an [`SreClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    authenticator: Option<Authenticator>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            authenticator: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the service URL. Defaults to [`DEFAULT_SERVICE_URL`].
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the authenticator that signs every request.
    pub fn authenticator(mut self, authenticator: impl Into<Authenticator>) -> Self {
        self.authenticator = Some(authenticator.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<SreClient> {
        let authenticator = self
            .authenticator
            .ok_or_else(|| Error::Config("authenticator is required".to_string()))?;

        // Parse and normalize base URL
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("mgmt-sre-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(SreClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                authenticator,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
