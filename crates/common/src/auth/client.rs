//! OAuth 2.0 client implementation with PKCE support
//!
//! Handles the token endpoint side of the authorization flow:
//! - Browser authorization URL building
//! - Authorization code exchange
//! - Token refresh
//!
//! No client secret is ever sent; the PKCE verifier proves possession.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::traits::TokenExchange;
use super::types::{OAuthConfig, OAuthError, TokenRecord, TokenResponse};

/// Request timeout for the token endpoint
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed before a response arrived
    RequestFailed(reqwest::Error),

    /// Token endpoint answered with a non-success status
    Status {
        status: u16,
        /// Provider error body, when it parses
        error: Option<OAuthError>,
    },

    /// Failed to parse response
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,

    /// Invalid configuration
    ConfigError(String),
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::Status { status, error: Some(e) } => {
                write!(f, "token endpoint returned {status}: {e}")
            }
            Self::Status { status, error: None } => write!(f, "token endpoint returned {status}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RequestFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// OAuth 2.0 public client (RFC 6749 + RFC 7636)
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration
    ///
    /// Setting `NADCTL_DISABLE_PROXY` makes the client ignore system proxies.
    ///
    /// # Examples
    /// ```
    /// use nadctl_common::auth::{OAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::new(
    ///     "client_id".to_string(),
    ///     "http://localhost:8888/callback".to_string(),
    ///     vec!["user-read-playback-state".to_string()],
    ///     "https://accounts.spotify.com/authorize".to_string(),
    ///     "https://accounts.spotify.com/api/token".to_string(),
    /// );
    /// let client = OAuthClient::new(config);
    /// ```
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let builder = Client::builder().timeout(TOKEN_REQUEST_TIMEOUT);
        let builder = if std::env::var_os("NADCTL_DISABLE_PROXY").is_some() {
            builder.no_proxy()
        } else {
            builder
        };
        let client = builder.build().unwrap_or_else(|_| Client::new());

        Self::with_http_client(config, client)
    }

    /// Create a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(config: OAuthConfig, client: Client) -> Self {
        Self { config, client }
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorization URL
    ///
    /// Parameters appear in a fixed order and each value is percent-encoded
    /// on its own.
    #[must_use]
    pub fn build_authorization_url(&self, state: &str, code_challenge: &str) -> String {
        let scope_string = self.config.scope_string();

        let mut params = vec![
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("scope", scope_string.as_str()),
        ];
        if self.config.show_dialog {
            params.push(("show_dialog", "true"));
        }

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.config.authorize_url, query_string)
    }

    /// Exchange an authorization code for a token record
    ///
    /// # Errors
    /// Returns error if:
    /// - The request cannot be sent
    /// - The endpoint answers non-2xx
    /// - Response parsing fails
    pub async fn exchange_code_for_token(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenRecord, OAuthClientError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];

        debug!(token_url = %self.config.token_url, "exchanging authorization code");
        let response = self.post_token_form(&form).await?;
        response.into_record(&self.config.client_id, None)
    }

    /// Refresh an access token
    ///
    /// # Errors
    /// Returns [`OAuthClientError::NoRefreshToken`] for an empty refresh
    /// token before any request is made; otherwise as
    /// [`Self::exchange_code_for_token`].
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRecord, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];

        debug!(token_url = %self.config.token_url, "refreshing access token");
        let response = self.post_token_form(&form).await?;
        response.into_record(&self.config.client_id, Some(refresh_token.to_string()))
    }

    async fn post_token_form(
        &self,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthClientError> {
        let response = self.client.post(&self.config.token_url).form(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<OAuthError>(&body).ok();
            warn!(status = status.as_u16(), error = ?error.as_ref().map(|e| &e.error), "token endpoint rejected request");
            return Err(OAuthClientError::Status { status: status.as_u16(), error });
        }

        response.json::<TokenResponse>().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl TokenExchange for OAuthClient {
    fn client_id(&self) -> &str {
        &self.config.client_id
    }

    fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        self.build_authorization_url(state, code_challenge)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenRecord, OAuthClientError> {
        self.exchange_code_for_token(code, code_verifier).await
    }

    async fn refresh_token(&self, current: &TokenRecord) -> Result<TokenRecord, OAuthClientError> {
        let refresh_token = current.refresh_token.as_deref().unwrap_or_default();
        self.refresh_access_token(refresh_token).await
    }
}
