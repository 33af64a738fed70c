//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the client id is not set there, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `NADCTL_SPOTIFY_CLIENT_ID`: Spotify application client id (required)
//! - `NADCTL_SPOTIFY_REDIRECT_URI`: Loopback redirect URI
//! - `NADCTL_TOKEN_CACHE_PATH`: Token cache file
//! - `NADCTL_AUTH_TIMEOUT_SECS`: Seconds to wait for the browser login
//! - `NADCTL_STATE_NONCE`: `random` or a fixed literal
//! - `NADCTL_LOG_FILTER`: `EnvFilter` directive
//! - `NADCTL_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./nadctl.toml`, `./nadctl.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. Relative to executable location

use std::path::{Path, PathBuf};

use nadctl_domain::constants::{TOKEN_CACHE_DIR_NAME, TOKEN_CACHE_FILE_NAME};
use nadctl_domain::{Config, LoggingConfig, NadError, Result, SpotifyConfig, StateNonce};

const CONFIG_FILE_NAMES: [&str; 4] = ["nadctl.toml", "nadctl.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `NadError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only the client id is required; every other variable falls back to its
/// default.
///
/// # Errors
/// Returns `NadError::Config` if the client id is missing or a value is
/// malformed.
pub fn load_from_env() -> Result<Config> {
    let mut spotify = SpotifyConfig::new(env_var("NADCTL_SPOTIFY_CLIENT_ID")?);

    if let Ok(redirect_uri) = std::env::var("NADCTL_SPOTIFY_REDIRECT_URI") {
        spotify.redirect_uri = redirect_uri;
    }
    if let Ok(path) = std::env::var("NADCTL_TOKEN_CACHE_PATH") {
        spotify.token_cache_path = Some(PathBuf::from(path));
    }
    if let Ok(secs) = std::env::var("NADCTL_AUTH_TIMEOUT_SECS") {
        spotify.auth_timeout_seconds = secs
            .trim()
            .parse::<u64>()
            .map_err(|e| NadError::Config(format!("Invalid auth timeout: {e}")))?;
    }
    if let Ok(nonce) = std::env::var("NADCTL_STATE_NONCE") {
        spotify.state_nonce = StateNonce::from_env_value(&nonce);
    }

    let mut logging = LoggingConfig::default();
    if let Ok(filter) = std::env::var("NADCTL_LOG_FILTER") {
        logging.filter = filter;
    }
    logging.json = env_bool("NADCTL_LOG_JSON", false);

    validate(Config { spotify, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
///
/// # Errors
/// Returns `NadError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(NadError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            NadError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| NadError::Config(format!("Failed to read config file: {e}")))?;

    validate(parse_config(&contents, &config_path)?)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| NadError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| NadError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(NadError::Config(format!("Unsupported config format: {extension}"))),
    }
}

fn validate(config: Config) -> Result<Config> {
    if config.spotify.client_id.trim().is_empty() {
        return Err(NadError::Config("spotify.client_id must not be empty".to_string()));
    }
    if config.spotify.auth_timeout_seconds == 0 {
        return Err(NadError::Config("spotify.auth_timeout_seconds must be positive".to_string()));
    }
    Ok(config)
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Platform default token cache location:
/// `<config dir>/nadctl/spotify_token.json`.
///
/// # Errors
/// Returns `NadError::Config` when the platform has no config directory.
pub fn default_token_cache_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(TOKEN_CACHE_DIR_NAME).join(TOKEN_CACHE_FILE_NAME))
        .ok_or_else(|| NadError::Config("no platform configuration directory".to_string()))
}

/// Configured token cache path, or the platform default.
///
/// # Errors
/// See [`default_token_cache_path`].
pub fn token_cache_path(config: &SpotifyConfig) -> Result<PathBuf> {
    match &config.token_cache_path {
        Some(path) => Ok(path.clone()),
        None => default_token_cache_path(),
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| NadError::Config(format!("Missing required environment variable: {key}")))
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
