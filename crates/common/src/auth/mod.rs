//! OAuth 2.0 + PKCE building blocks
//!
//! Provider-agnostic pieces of the Authorization Code + PKCE flow used by
//! `nadctl-infra` to authenticate against Spotify:
//!
//! - **PKCE**: RFC 7636 verifier/challenge generation and state nonces
//! - **Token exchange**: code and refresh grants against the token endpoint
//! - **Token cache**: persisted storage for a single token record
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  TokenExchange   │  trait ◄── OAuthClient (reqwest, form-encoded POST)
//! └──────────────────┘
//! ┌──────────────────┐
//! │   TokenCache     │  trait ◄── FileTokenCache (atomic JSON file)
//! └──────────────────┘
//!          ▲
//!          └── TokenRecord  (access token, refresh token, RFC 3339 expiry)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use nadctl_common::auth::{OAuthClient, OAuthConfig, PkceChallenge, TokenExchange};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OAuthClient::new(OAuthConfig::new(
//!     "client_id".to_string(),
//!     "http://localhost:8888/callback".to_string(),
//!     vec!["user-read-playback-state".to_string()],
//!     "https://accounts.spotify.com/authorize".to_string(),
//!     "https://accounts.spotify.com/api/token".to_string(),
//! ));
//!
//! let pkce = PkceChallenge::generate()?;
//! let url = client.authorization_url("state", &pkce.code_challenge);
//! // Open `url`, receive `code` on the redirect...
//! let token = client.exchange_code("code", &pkce.code_verifier).await?;
//! println!("expires in {}s", token.seconds_until_expiry());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod pkce;
pub mod traits;
pub mod types;

pub use cache::{FileTokenCache, TokenCacheError};
pub use client::{OAuthClient, OAuthClientError};
pub use pkce::{
    generate_code_challenge, generate_code_verifier, generate_state, validate_state,
    PkceChallenge, PkceError,
};
pub use traits::{TokenCache, TokenExchange};
pub use types::{OAuthConfig, OAuthError, TokenRecord, TokenResponse};
