//! Application constants
//!
//! Centralized location for the Spotify endpoints, timing windows and
//! defaults used across the nadctl crates.

// Spotify endpoints
pub const SPOTIFY_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Scopes requested during authorization
pub const SPOTIFY_SCOPES: [&str; 3] =
    ["user-read-currently-playing", "user-read-playback-state", "user-modify-playback-state"];

// Redirect defaults
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";
pub const DEFAULT_CALLBACK_HOST: &str = "localhost";
pub const DEFAULT_CALLBACK_PORT: u16 = 8888;
pub const DEFAULT_CALLBACK_PATH: &str = "/callback";

/// Literal state nonce used when a fixed nonce is configured
pub const DEFAULT_STATE_NONCE: &str = "nadctl-state";

/// Remaining lifetime below which a restored token is refreshed eagerly.
/// The validity margin and token request timeout live with the OAuth client.
pub const TOKEN_RESTORE_REFRESH_THRESHOLD_SECS: i64 = 300;

// Callback server timing
pub const CALLBACK_WARMUP_MS: u64 = 300;
pub const CALLBACK_SHUTDOWN_GRACE_SECS: u64 = 5;
/// Deadline for the callback handler once a request has been parsed.
/// Does not bound how long a client may take to send its request head.
pub const CALLBACK_HANDLER_TIMEOUT_SECS: u64 = 10;
pub const CALLBACK_PUBLISH_DEADLINE_SECS: u64 = 1;

// Web API client timeout
pub const API_HTTP_TIMEOUT_SECS: u64 = 15;

/// Default time a user gets to finish the browser login
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 120;

// Token cache
pub const TOKEN_CACHE_DIR_NAME: &str = "nadctl";
pub const TOKEN_CACHE_FILE_NAME: &str = "spotify_token.json";
