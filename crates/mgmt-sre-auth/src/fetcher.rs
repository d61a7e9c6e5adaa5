//! Username/password exchange against the token endpoint.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::config::PasswordCredentials;
use crate::error::{AuthError, Result};
use crate::token::{TOKEN_LIFETIME_SECS, TokenRecord};

/// Timeout applied to every token request, whatever client sends it.
pub const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Authentication domain sent with every token request.
pub const AUTH_DOMAIN: &str = "local";

const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
    domain: &'a str,
}

/// Token endpoint response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Performs the network exchange that produces a fresh [`TokenRecord`].
///
/// Holds no token state of its own, so clones can run on background tasks.
#[derive(Debug, Clone)]
pub struct TokenFetcher {
    client: reqwest::Client,
    credentials: PasswordCredentials,
    clock: SharedClock,
    lifetime_secs: i64,
    request_timeout: Duration,
}

impl TokenFetcher {
    /// Create a fetcher with its own HTTP client.
    pub fn new(credentials: PasswordCredentials, clock: SharedClock) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .user_agent(format!("mgmt-sre-auth/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, credentials, clock))
    }

    /// Create a fetcher around an existing HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        credentials: PasswordCredentials,
        clock: SharedClock,
    ) -> Self {
        Self {
            client,
            credentials,
            clock,
            lifetime_secs: TOKEN_LIFETIME_SECS,
            request_timeout: TOKEN_REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Token endpoint URL.
    pub fn auth_url(&self) -> &str {
        &self.credentials.auth_url
    }

    pub fn credentials(&self) -> &PasswordCredentials {
        &self.credentials
    }

    /// POST the credentials and build a record from the response.
    pub async fn fetch(&self) -> Result<TokenRecord> {
        let body = TokenRequest {
            username: &self.credentials.username,
            password: &self.credentials.password,
            domain: AUTH_DOMAIN,
        };

        tracing::debug!(url = %self.credentials.auth_url, "Requesting bearer token");

        let response = self
            .client
            .post(&self.credentials.auth_url)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(ACCEPT, APPLICATION_JSON)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::TokenFetch {
                status: None,
                message: format!("Token request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::TokenFetch {
                status: Some(status.as_u16()),
                message: format!("auth request failed with status: {}", status),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| AuthError::TokenDecode(format!("Failed to read token response: {}", e)))?;
        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| AuthError::TokenDecode(format!("Failed to parse token response: {}", e)))?;

        if parsed.access_token.is_empty() {
            return Err(AuthError::TokenDecode(
                "Token response contained an empty accessToken".to_string(),
            ));
        }

        let record = TokenRecord::issue(parsed.access_token, self.clock.now(), self.lifetime_secs);
        tracing::info!(
            token_type = parsed.token_type.as_deref().unwrap_or("unknown"),
            expires_at = record.expires_at,
            refresh_at = record.refresh_at,
            "Bearer token issued"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(server: &MockServer, clock: Arc<ManualClock>) -> TokenFetcher {
        let credentials = PasswordCredentials {
            username: "u".to_string(),
            password: "p".to_string(),
            auth_url: format!("{}/token", server.uri()),
        };
        TokenFetcher::new(credentials, clock).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_credentials_and_parses_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/json"))
            .and(header("accept", "application/json"))
            .and(body_json(serde_json::json!({
                "username": "u",
                "password": "p",
                "domain": "local"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "abc123",
                "tokenType": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let clock = Arc::new(ManualClock::new(1_000));
        let record = fetcher(&server, clock).fetch().await.unwrap();

        assert_eq!(record.value, "abc123");
        assert_eq!(record.issued_at, 1_000);
        assert_eq!(record.expires_at, 1_000 + TOKEN_LIFETIME_SECS);
        assert_eq!(record.refresh_at, 1_000 + TOKEN_LIFETIME_SECS * 4 / 5);
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = fetcher(&server, Arc::new(ManualClock::new(0)))
            .fetch()
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("401 Unauthorized"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = fetcher(&server, Arc::new(ManualClock::new(0)))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenDecode(_)));
    }

    #[tokio::test]
    async fn test_missing_or_empty_token_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tokenType": "x" })),
            )
            .mount(&server)
            .await;
        let err = fetcher(&server, Arc::new(ManualClock::new(0)))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenDecode(_)));

        server.reset().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "" })),
            )
            .mount(&server)
            .await;
        let err = fetcher(&server, Arc::new(ManualClock::new(0)))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenDecode(_)));
    }

    #[tokio::test]
    async fn test_injected_client_still_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "accessToken": "slow" }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let credentials = PasswordCredentials {
            username: "u".to_string(),
            password: "p".to_string(),
            auth_url: format!("{}/token", server.uri()),
        };
        // reqwest::Client::new() has no timeout of its own.
        let fetcher = TokenFetcher::with_client(
            reqwest::Client::new(),
            credentials,
            Arc::new(ManualClock::new(0)),
        )
        .with_request_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, AuthError::TokenFetch { status: None, .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_default_request_timeout() {
        let credentials = PasswordCredentials {
            username: "u".to_string(),
            password: "p".to_string(),
            auth_url: "http://localhost/token".to_string(),
        };
        let fetcher = TokenFetcher::with_client(
            reqwest::Client::new(),
            credentials,
            Arc::new(ManualClock::new(0)),
        );
        assert_eq!(fetcher.request_timeout, TOKEN_REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_has_no_status() {
        let credentials = PasswordCredentials {
            username: "u".to_string(),
            password: "p".to_string(),
            auth_url: "http://127.0.0.1:1/token".to_string(),
        };
        let err = TokenFetcher::new(credentials, Arc::new(ManualClock::new(0)))
            .unwrap()
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenFetch { status: None, .. }));
    }
}
