//! Configuration structures
//!
//! Loaded by `nadctl_infra::config::loader` from the environment or a TOML /
//! JSON file. Every field except the client id has a default.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUTH_TIMEOUT_SECS, DEFAULT_REDIRECT_URI, DEFAULT_STATE_NONCE, SPOTIFY_API_BASE_URL,
    SPOTIFY_AUTHORIZE_URL, SPOTIFY_TOKEN_URL,
};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the OAuth `state` parameter is chosen for each authorization attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateNonce {
    /// Fresh random nonce per attempt
    #[default]
    Random,
    /// The same literal every attempt, compared verbatim
    Fixed(String),
}

impl StateNonce {
    /// The literal `nadctl-state` nonce.
    #[must_use]
    pub fn legacy() -> Self {
        Self::Fixed(DEFAULT_STATE_NONCE.to_string())
    }

    /// Parse the environment form: `random` or any other literal.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("random") {
            Self::Random
        } else {
            Self::Fixed(value.to_string())
        }
    }
}

/// Spotify application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyConfig {
    /// Client id of the registered Spotify application
    pub client_id: String,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Where the token is persisted; `None` selects the platform config dir
    #[serde(default)]
    pub token_cache_path: Option<PathBuf>,

    #[serde(default = "default_auth_timeout_seconds")]
    pub auth_timeout_seconds: u64,

    #[serde(default)]
    pub state_nonce: StateNonce,

    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl SpotifyConfig {
    /// Configuration with defaults for everything but the client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: default_redirect_uri(),
            token_cache_path: None,
            auth_timeout_seconds: default_auth_timeout_seconds(),
            state_nonce: StateNonce::default(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
        }
    }

    #[must_use]
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_seconds)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info,nadctl_infra=debug`
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter(), json: false }
    }
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

fn default_auth_timeout_seconds() -> u64 {
    DEFAULT_AUTH_TIMEOUT_SECS
}

fn default_authorize_url() -> String {
    SPOTIFY_AUTHORIZE_URL.to_string()
}

fn default_token_url() -> String {
    SPOTIFY_TOKEN_URL.to_string()
}

fn default_api_base_url() -> String {
    SPOTIFY_API_BASE_URL.to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}
