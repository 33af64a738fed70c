//! Spotify service facade
//!
//! Assembles the token cache, OAuth client, session, callback server and
//! browser launcher from a [`SpotifyConfig`] and exposes the operations an
//! application needs: authorize, disconnect and control playback.

use std::sync::Arc;
use std::time::Duration;

use nadctl_common::auth::{FileTokenCache, OAuthClient, OAuthConfig, TokenCache, TokenExchange};
use nadctl_domain::constants::SPOTIFY_SCOPES;
use nadctl_domain::{Result, SpotifyConfig};
use tracing::info;

use super::player::Player;
use crate::auth::{Authenticator, BrowserLauncher, CallbackServer, SystemBrowser};
use crate::config::token_cache_path;
use crate::session::Session;

/// Entry point for Spotify integration.
pub struct SpotifyService {
    session: Arc<Session>,
    authenticator: Authenticator,
    player: Player,
    default_timeout: Duration,
}

impl SpotifyService {
    /// Build the production stack and resume any cached session.
    ///
    /// # Errors
    /// Returns `NadError::Config` if no token cache location can be resolved.
    pub async fn new(config: SpotifyConfig) -> Result<Self> {
        let cache = FileTokenCache::new(token_cache_path(&config)?);
        info!(path = %cache.path().display(), "using token cache");

        let oauth = OAuthClient::new(OAuthConfig::new(
            config.client_id.clone(),
            config.redirect_uri.clone(),
            SPOTIFY_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            config.authorize_url.clone(),
            config.token_url.clone(),
        ));

        Ok(Self::with_components(config, Arc::new(oauth), Arc::new(cache), Arc::new(SystemBrowser))
            .await)
    }

    /// Build around caller-supplied collaborators.
    pub async fn with_components(
        config: SpotifyConfig,
        exchange: Arc<dyn TokenExchange>,
        cache: Arc<dyn TokenCache>,
        browser: Arc<dyn BrowserLauncher>,
    ) -> Self {
        let session = Arc::new(
            Session::restore(
                exchange,
                cache,
                config.redirect_uri.clone(),
                config.api_base_url.clone(),
            )
            .await,
        );
        let callback = Arc::new(CallbackServer::new(config.redirect_uri.clone()));
        let authenticator =
            Authenticator::new(Arc::clone(&session), callback, browser, config.state_nonce.clone());

        Self {
            player: Player::new(Arc::clone(&session)),
            session,
            authenticator,
            default_timeout: config.auth_timeout(),
        }
    }

    /// Run the browser authorization flow.
    ///
    /// # Errors
    /// See [`Authenticator::authenticate`].
    pub async fn authenticate(&self, timeout: Duration) -> Result<()> {
        self.authenticator.authenticate(timeout).await
    }

    /// [`Self::authenticate`] with the configured timeout.
    ///
    /// # Errors
    /// See [`Authenticator::authenticate`].
    pub async fn authenticate_with_default_timeout(&self) -> Result<()> {
        self.authenticate(self.default_timeout).await
    }

    /// Authorization URL to show the user when no browser could be opened.
    pub async fn manual_authorization_url(&self) -> Option<String> {
        self.authenticator.manual_authorization_url().await
    }

    /// Stop a waiting authorization attempt, e.g. on application shutdown.
    pub async fn cancel_authentication(&self) {
        self.authenticator.cancel().await;
    }

    /// # Errors
    /// Returns `NadError::Cache` if the token cache cannot be cleared.
    pub async fn disconnect(&self) -> Result<()> {
        self.session.disconnect().await
    }

    pub async fn is_connected(&self) -> bool {
        self.session.is_connected().await
    }

    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use nadctl_common::testing::{valid_token, MemoryTokenCache, MockTokenExchange};

    use super::*;

    #[tokio::test]
    async fn resumes_cached_session() {
        let config = SpotifyConfig::new("abc");
        let cache = Arc::new(MemoryTokenCache::with_record(valid_token("abc")));

        let service = SpotifyService::with_components(
            config,
            Arc::new(MockTokenExchange::new("abc")),
            cache.clone(),
            Arc::new(SystemBrowser),
        )
        .await;

        assert!(service.is_connected().await);
        service.disconnect().await.unwrap();
        assert!(!service.is_connected().await);
        assert!(cache.stored().is_none());
    }
}
