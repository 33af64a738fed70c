//! Shared OAuth building blocks for nadctl.
//!
//! - [`auth`]: PKCE generation, token records, the token endpoint client and
//!   the token cache abstraction
//! - `testing` (feature `test-utils`): in-memory mocks for the auth traits

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use auth::{
    FileTokenCache, OAuthClient, OAuthClientError, OAuthConfig, PkceChallenge, PkceError,
    TokenCache, TokenCacheError, TokenExchange, TokenRecord,
};
