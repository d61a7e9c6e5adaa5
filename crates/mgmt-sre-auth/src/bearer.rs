//! Bearer token authenticator: token cache, singleflight fetch and
//! refresh-ahead.
//!
//! Every call to [`BearerTokenAuthenticator::token`] lands in one of three
//! states:
//!
//! 1. no usable token: fetch synchronously behind the singleflight lock
//! 2. token cached and not yet due: serve it, no I/O
//! 3. token cached and past `refresh_at`: serve it and refresh in the background
//!
//! The record is guarded by a short-lived `parking_lot` mutex that is never
//! held across an `.await`. The singleflight lock is a separate async mutex
//! that only the synchronous path takes.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::task::JoinHandle;

use crate::authenticator::Authenticate;
use crate::clock::{SharedClock, SystemClock};
use crate::config::PasswordCredentials;
use crate::error::{AuthError, Result};
use crate::fetcher::TokenFetcher;
use crate::token::{TokenInfo, TokenRecord};

/// Minimum spacing between two background refresh attempts, in seconds.
pub const REFRESH_GRACE_SECS: i64 = 90;

/// Condition under which [`BearerTokenAuthenticator::token`] fetches synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncFetchGuard {
    /// No token yet, or the cached token is past `expires_at`.
    #[default]
    Expired,
    /// No token yet, or `now < expires_at`.
    ///
    /// This is the legacy guard. While a token is valid it sends every call
    /// through the singleflight lock and never reaches the refresh-ahead
    /// branch, so a token is only replaced once it has already expired.
    Literal,
}

impl SyncFetchGuard {
    fn requires_sync_fetch(self, record: &TokenRecord, now: i64) -> bool {
        match self {
            SyncFetchGuard::Expired => record.is_empty() || record.is_expired(now),
            SyncFetchGuard::Literal => record.is_empty() || now < record.expires_at,
        }
    }
}

/// Receives the outcome of background refreshes.
pub trait RefreshObserver: Send + Sync + std::fmt::Debug {
    fn refreshed(&self, _record: &TokenRecord) {}

    fn refresh_failed(&self, _error: &AuthError) {}
}

#[derive(Debug, Default)]
struct TokenState {
    record: TokenRecord,
    refresh_in_flight: bool,
    /// No new background refresh is dispatched until `now` passes this.
    next_refresh_attempt: i64,
    refresh_task: Option<JoinHandle<()>>,
    /// Completed synchronous fetches, successful or not.
    sync_fetches: u64,
    /// Error of the latest synchronous fetch, cleared on success.
    last_sync_error: Option<AuthError>,
}

#[derive(Debug)]
struct Shared {
    fetcher: TokenFetcher,
    clock: SharedClock,
    guard: SyncFetchGuard,
    observer: Option<Arc<dyn RefreshObserver>>,
    state: parking_lot::Mutex<TokenState>,
    fetch_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    fn store_sync_result(&self, result: &Result<TokenRecord>) {
        let mut state = self.state.lock();
        state.sync_fetches += 1;
        match result {
            Ok(record) => {
                state.record = record.clone();
                state.last_sync_error = None;
            }
            Err(e) => state.last_sync_error = Some(e.clone()),
        }
    }

    fn finish_refresh(&self, result: Result<TokenRecord>) {
        match result {
            Ok(record) => {
                if let Some(observer) = &self.observer {
                    observer.refreshed(&record);
                }
                let mut state = self.state.lock();
                state.record = record;
                state.refresh_in_flight = false;
                tracing::debug!("Background token refresh completed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Background token refresh failed, keeping cached token");
                if let Some(observer) = &self.observer {
                    observer.refresh_failed(&e);
                }
                self.state.lock().refresh_in_flight = false;
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(task) = self.state.get_mut().refresh_task.take() {
            task.abort();
        }
    }
}

/// Authenticator that exchanges a username/password for a bearer token.
///
/// Clones share the same token cache.
#[derive(Debug, Clone)]
pub struct BearerTokenAuthenticator {
    shared: Arc<Shared>,
}

impl BearerTokenAuthenticator {
    /// Create an authenticator with the system clock and default guard.
    pub fn new(credentials: PasswordCredentials) -> Result<Self> {
        Self::builder(credentials).build()
    }

    pub fn builder(credentials: PasswordCredentials) -> BearerTokenAuthenticatorBuilder {
        BearerTokenAuthenticatorBuilder::new(credentials)
    }

    /// Return a usable token, fetching or refreshing as needed.
    pub async fn token(&self) -> Result<String> {
        let now = self.shared.clock.now();
        let sync = {
            let state = self.shared.state.lock();
            self.shared.guard.requires_sync_fetch(&state.record, now)
        };

        if sync {
            self.fetch_synchronously().await?;
        } else if self.begin_refresh(now) {
            self.spawn_refresh();
        } else {
            tracing::trace!("Serving cached bearer token");
        }

        let state = self.shared.state.lock();
        if state.record.is_empty() {
            return Err(AuthError::Authentication(
                "no bearer token available".to_string(),
            ));
        }
        Ok(state.record.value.clone())
    }

    /// Snapshot of the cached record.
    pub fn record(&self) -> TokenRecord {
        self.shared.state.lock().record.clone()
    }

    /// Display information for the cached token, if one has been fetched.
    pub fn token_info(&self) -> Option<TokenInfo> {
        let now = self.shared.clock.now();
        let state = self.shared.state.lock();
        (!state.record.is_empty()).then(|| state.record.info(now))
    }

    pub fn sync_fetch_guard(&self) -> SyncFetchGuard {
        self.shared.guard
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.shared.state.lock().refresh_in_flight
    }

    /// Wait for the most recently dispatched background refresh.
    ///
    /// Returns `false` when there was nothing to wait for.
    pub async fn wait_for_refresh(&self) -> bool {
        let task = self.shared.state.lock().refresh_task.take();
        match task {
            Some(task) => {
                if let Err(e) = task.await {
                    tracing::warn!(error = %e, "Background token refresh task did not complete");
                }
                true
            }
            None => false,
        }
    }

    /// Fetch under the singleflight lock.
    ///
    /// Callers that queued while another caller's fetch failed get that
    /// error instead of retrying one after another.
    async fn fetch_synchronously(&self) -> Result<()> {
        let fetches_seen = self.shared.state.lock().sync_fetches;
        let _singleflight = self.shared.fetch_lock.lock().await;

        let now = self.shared.clock.now();
        {
            let state = self.shared.state.lock();
            if state.record.is_usable(now) {
                tracing::debug!("Token already fetched by a concurrent caller");
                return Ok(());
            }
            if state.sync_fetches != fetches_seen {
                if let Some(e) = &state.last_sync_error {
                    tracing::debug!(error = %e, "Concurrent token fetch failed, sharing its error");
                    return Err(e.clone());
                }
            }
        }

        tracing::info!(url = %self.shared.fetcher.auth_url(), "Fetching bearer token");
        let result = self.shared.fetcher.fetch().await;
        self.shared.store_sync_result(&result);
        result.map(|_| ())
    }

    fn begin_refresh(&self, now: i64) -> bool {
        let mut state = self.shared.state.lock();
        if state.refresh_in_flight
            || !state.record.refresh_due(now)
            || now <= state.next_refresh_attempt
        {
            return false;
        }
        state.refresh_in_flight = true;
        state.next_refresh_attempt = now + REFRESH_GRACE_SECS;
        true
    }

    fn spawn_refresh(&self) {
        tracing::debug!("Token due for refresh, refreshing in background");
        let fetcher = self.shared.fetcher.clone();
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let task = tokio::spawn(async move {
            let result = fetcher.fetch().await;
            if let Some(shared) = shared.upgrade() {
                shared.finish_refresh(result);
            }
        });
        self.shared.state.lock().refresh_task = Some(task);
    }
}

#[async_trait]
impl Authenticate for BearerTokenAuthenticator {
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        let token = self.token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            AuthError::Authentication("token is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let credentials = self.shared.fetcher.credentials();
        if credentials.username.is_empty()
            || credentials.password.is_empty()
            || credentials.auth_url.is_empty()
        {
            return Err(AuthError::Configuration(
                "username, password and auth_url are all required".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`BearerTokenAuthenticator`].
#[derive(Debug)]
pub struct BearerTokenAuthenticatorBuilder {
    credentials: PasswordCredentials,
    clock: Option<SharedClock>,
    guard: SyncFetchGuard,
    observer: Option<Arc<dyn RefreshObserver>>,
    http: Option<reqwest::Client>,
}

impl BearerTokenAuthenticatorBuilder {
    pub fn new(credentials: PasswordCredentials) -> Self {
        Self {
            credentials,
            clock: None,
            guard: SyncFetchGuard::default(),
            observer: None,
            http: None,
        }
    }

    /// Use a custom time source.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Select the synchronous-fetch guard.
    pub fn sync_fetch_guard(mut self, guard: SyncFetchGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Report background refresh outcomes to `observer`.
    pub fn observer(mut self, observer: Arc<dyn RefreshObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Use an existing HTTP client for token requests.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn build(self) -> Result<BearerTokenAuthenticator> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let fetcher = match self.http {
            Some(client) => TokenFetcher::with_client(client, self.credentials, clock.clone()),
            None => TokenFetcher::new(self.credentials, clock.clone())?,
        };

        let authenticator = BearerTokenAuthenticator {
            shared: Arc::new(Shared {
                fetcher,
                clock,
                guard: self.guard,
                observer: self.observer,
                state: parking_lot::Mutex::new(TokenState::default()),
                fetch_lock: tokio::sync::Mutex::new(()),
            }),
        };
        authenticator.validate()?;
        Ok(authenticator)
    }
}
