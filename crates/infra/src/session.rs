//! Authenticated Spotify session
//!
//! Owns the current token and the Web API client built from it. Both live in
//! one [`Connection`] value that is swapped as a whole, so a session is either
//! fully connected or not connected at all.
//!
//! Tokens are refreshed lazily: [`Session::refresh_if_needed`] is called
//! before each upstream request and does nothing while the token is still
//! valid for more than a minute. Concurrent refreshes are serialized and each
//! waiter re-checks validity once it holds the lock, so a burst of calls
//! issues at most one refresh.

use std::sync::Arc;

use nadctl_common::auth::{TokenCache, TokenExchange, TokenRecord};
use nadctl_domain::constants::TOKEN_RESTORE_REFRESH_THRESHOLD_SECS;
use nadctl_domain::{NadError, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::errors::{IntoNadError, InfraError};
use crate::spotify::SpotifyApi;

/// A token together with the API client that sends it.
#[derive(Debug, Clone)]
pub struct Connection {
    token: TokenRecord,
    api: SpotifyApi,
}

impl Connection {
    fn new(token: TokenRecord, api_base_url: &str) -> Result<Self> {
        let api = SpotifyApi::new(api_base_url, &token.access_token)
            .map_err(|e| NadError::Internal(e.to_string()))?;
        Ok(Self { token, api })
    }

    #[must_use]
    pub fn token(&self) -> &TokenRecord {
        &self.token
    }

    #[must_use]
    pub fn api(&self) -> &SpotifyApi {
        &self.api
    }
}

/// Spotify session state
pub struct Session {
    client_id: String,
    redirect_uri: String,
    api_base_url: String,
    exchange: Arc<dyn TokenExchange>,
    cache: Arc<dyn TokenCache>,
    connection: RwLock<Option<Connection>>,
    refresh_lock: Mutex<()>,
    pending_state: Mutex<Option<String>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a disconnected session.
    pub fn new(
        exchange: Arc<dyn TokenExchange>,
        cache: Arc<dyn TokenCache>,
        redirect_uri: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: exchange.client_id().to_string(),
            redirect_uri: redirect_uri.into(),
            api_base_url: api_base_url.into(),
            exchange,
            cache,
            connection: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            pending_state: Mutex::new(None),
        }
    }

    /// Create a session and try to resume from the token cache.
    ///
    /// Never fails: a missing, unreadable, foreign or unrefreshable cache
    /// leaves the session disconnected.
    pub async fn restore(
        exchange: Arc<dyn TokenExchange>,
        cache: Arc<dyn TokenCache>,
        redirect_uri: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        let session = Self::new(exchange, cache, redirect_uri, api_base_url);
        session.restore_from_cache().await;
        session
    }

    async fn restore_from_cache(&self) {
        let record = match self.cache.load().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("no cached token");
                return;
            }
            Err(err) => {
                warn!(error = %err, "failed to load token cache; starting disconnected");
                return;
            }
        };

        if record.client_id != self.client_id {
            debug!("cached token belongs to a different client id; ignoring it");
            return;
        }

        if record.expires_within(TOKEN_RESTORE_REFRESH_THRESHOLD_SECS) && record.has_refresh_token()
        {
            info!("cached token is about to expire; refreshing");
            match self.exchange.refresh_token(&record).await {
                Ok(fresh) => {
                    if let Err(err) = self.install_and_persist(fresh).await {
                        warn!(error = %err, "failed to install refreshed token");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "refresh of cached token failed; clearing cache");
                    self.clear_cache_quietly().await;
                }
            }
            return;
        }

        if record.is_expired() {
            info!("cached token expired without a refresh token; clearing cache");
            self.clear_cache_quietly().await;
            return;
        }

        match Connection::new(record, &self.api_base_url) {
            Ok(connection) => {
                *self.connection.write().await = Some(connection);
                info!("restored Spotify session from cache");
            }
            Err(err) => warn!(error = %err, "cached token is unusable"),
        }
    }

    async fn clear_cache_quietly(&self) {
        if let Err(err) = self.cache.clear().await {
            warn!(error = %err, "failed to clear token cache");
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn exchange(&self) -> &Arc<dyn TokenExchange> {
        &self.exchange
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Whether the installed token is usable without a refresh.
    pub async fn is_token_valid(&self) -> bool {
        self.connection.read().await.as_ref().is_some_and(|c| c.token.is_valid())
    }

    /// Snapshot of the installed token.
    pub async fn token(&self) -> Option<TokenRecord> {
        self.connection.read().await.as_ref().map(|c| c.token.clone())
    }

    pub async fn seconds_until_expiry(&self) -> Option<i64> {
        self.connection.read().await.as_ref().map(|c| c.token.seconds_until_expiry())
    }

    /// API client for the installed token.
    ///
    /// # Errors
    /// Returns `NadError::NotConnected` when no token is installed.
    pub async fn api(&self) -> Result<SpotifyApi> {
        self.connection.read().await.as_ref().map(|c| c.api.clone()).ok_or(NadError::NotConnected)
    }

    /// Replace the connection with one built from `token`.
    ///
    /// # Errors
    /// Returns `NadError::Internal` if the API client cannot be built.
    pub async fn install(&self, token: TokenRecord) -> Result<()> {
        let connection = Connection::new(token, &self.api_base_url)?;
        *self.connection.write().await = Some(connection);
        Ok(())
    }

    /// Install `token` and write it to the cache. A failed write is logged
    /// and otherwise ignored.
    ///
    /// # Errors
    /// See [`Self::install`].
    pub async fn install_and_persist(&self, token: TokenRecord) -> Result<()> {
        self.install(token.clone()).await?;

        if let Err(err) = self.cache.save(&token).await {
            let err = NadError::CacheSaveFailed(err.to_string());
            warn!(error = %err, "token installed but not persisted");
        }
        Ok(())
    }

    /// Refresh the token unless it is still valid.
    ///
    /// No-op when disconnected.
    ///
    /// # Errors
    /// - `NadError::NoRefreshToken` if the token is stale and cannot be
    ///   refreshed
    /// - `NadError::TokenExchangeFailed` if the token endpoint rejects the
    ///   refresh
    pub async fn refresh_if_needed(&self) -> Result<()> {
        if self.connection.read().await.as_ref().map_or(true, |c| c.token.is_valid()) {
            return Ok(());
        }

        let _refreshing = self.refresh_lock.lock().await;

        let current = match self.connection.read().await.as_ref() {
            None => return Ok(()),
            Some(c) if c.token.is_valid() => return Ok(()),
            Some(c) => c.token.clone(),
        };

        if !current.has_refresh_token() {
            return Err(NadError::NoRefreshToken);
        }

        debug!(seconds_left = current.seconds_until_expiry(), "refreshing access token");
        let fresh = self
            .exchange
            .refresh_token(&current)
            .await
            .map_err(|e| NadError::from(InfraError::from(e)))?;

        self.install_and_persist(fresh).await?;
        info!("access token refreshed");
        Ok(())
    }

    /// Drop the connection and clear the persisted token.
    ///
    /// # Errors
    /// Returns `NadError::Cache` if the cache cannot be cleared; the
    /// in-memory connection is gone regardless.
    pub async fn disconnect(&self) -> Result<()> {
        *self.connection.write().await = None;
        self.cache.clear().await.map_err(IntoNadError::into_nad)?;
        info!("disconnected from Spotify");
        Ok(())
    }

    /// Record the state nonce of an authorization attempt in progress.
    pub async fn set_pending_state(&self, state: Option<String>) {
        *self.pending_state.lock().await = state;
    }

    pub async fn pending_state(&self) -> Option<String> {
        self.pending_state.lock().await.clone()
    }
}
