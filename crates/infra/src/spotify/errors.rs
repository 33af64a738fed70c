//! Spotify Web API error types

use std::time::Duration;

use thiserror::Error;

/// Failure of a single Web API request
#[derive(Debug, Error)]
pub enum SpotifyApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SpotifyApiError {
    /// Whether the access token was rejected.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
