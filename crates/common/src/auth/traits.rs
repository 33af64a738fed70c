//! Traits for token exchange and token persistence
//!
//! These traits let the session and the authorization flow run against
//! in-memory doubles in tests and against the real OAuth endpoint and file
//! store in production.

use async_trait::async_trait;

use super::cache::TokenCacheError;
use super::client::OAuthClientError;
use super::types::TokenRecord;

/// Trait for OAuth token endpoint operations
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Client id the tokens are issued to
    fn client_id(&self) -> &str;

    /// Build the browser authorization URL for one attempt
    ///
    /// # Arguments
    /// * `state` - Nonce echoed back on the callback
    /// * `code_challenge` - PKCE challenge (S256)
    fn authorization_url(&self, state: &str, code_challenge: &str) -> String;

    /// Exchange an authorization code for a token
    ///
    /// # Errors
    /// Returns error if the request fails, the endpoint answers non-2xx, or
    /// the body cannot be parsed
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenRecord, OAuthClientError>;

    /// Obtain a new access token using the refresh token in `current`
    ///
    /// The returned record keeps `current`'s refresh token when the endpoint
    /// does not issue a new one.
    ///
    /// # Errors
    /// Returns [`OAuthClientError::NoRefreshToken`] without any network I/O
    /// when `current` has no refresh token
    async fn refresh_token(&self, current: &TokenRecord) -> Result<TokenRecord, OAuthClientError>;
}

/// Persisted storage for a single token record
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Load the stored record
    ///
    /// `Ok(None)` means nothing is stored.
    ///
    /// # Errors
    /// Returns error if the store exists but cannot be read or parsed
    async fn load(&self) -> Result<Option<TokenRecord>, TokenCacheError>;

    /// Replace the stored record
    ///
    /// # Errors
    /// Returns error if the record cannot be written
    async fn save(&self, record: &TokenRecord) -> Result<(), TokenCacheError>;

    /// Remove the stored record. Clearing an empty store succeeds.
    ///
    /// # Errors
    /// Returns error if an existing record cannot be removed
    async fn clear(&self) -> Result<(), TokenCacheError>;
}
