//! Error types used throughout the application

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a token request failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenExchangeFailure {
    /// The token endpoint answered with a non-2xx status
    #[error("token endpoint returned status {status_code}{}", format_detail(.detail))]
    Status { status_code: u16, detail: Option<String> },

    /// The request never produced a response
    #[error("network error: {message}")]
    Network { message: String },

    /// A 2xx response whose body is not a token
    #[error("invalid token response: {message}")]
    InvalidResponse { message: String },
}

fn format_detail(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(" ({d})")).unwrap_or_default()
}

/// Main error type for nadctl
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum NadError {
    #[error("not connected to Spotify")]
    NotConnected,

    #[error("callback port already in use: {0}")]
    PortBusy(String),

    #[error("invalid redirect URI: {0}")]
    InvalidRedirect(String),

    #[error("authentication timed out after {0:?}")]
    AuthTimeout(Duration),

    #[error("authentication was interrupted by application shutdown")]
    AuthInterrupted,

    #[error("OAuth state mismatch")]
    InvalidState,

    #[error("{0}")]
    AuthError(String),

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(TokenExchangeFailure),

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("nothing is currently playing")]
    NothingPlaying,

    #[error("no active playback session")]
    NoActivePlayback,

    #[error("failed to launch browser: {0}")]
    BrowserLaunchFailed(String),

    #[error("failed to save token cache: {0}")]
    CacheSaveFailed(String),

    #[error("token cache error: {0}")]
    Cache(String),

    #[error("failed to {operation}: {message}")]
    Upstream { operation: String, message: String },

    #[error("{0} is not implemented")]
    NotImplemented(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NadError {
    /// Wrap an upstream failure with the name of the operation that issued it.
    pub fn upstream(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Upstream { operation: operation.into(), message: err.to_string() }
    }

    /// Whether this error ends an authentication attempt without the user
    /// having done anything wrong (shutdown or timeout).
    #[must_use]
    pub fn is_auth_abort(&self) -> bool {
        matches!(self, Self::AuthInterrupted | Self::AuthTimeout(_))
    }
}

/// Result type alias for nadctl operations
pub type Result<T> = std::result::Result<T, NadError>;
