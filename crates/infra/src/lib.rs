//! # nadctl Infrastructure
//!
//! Spotify authorization and playback on top of the ports in
//! `nadctl-common`.
//!
//! This crate contains:
//! - The loopback OAuth callback server and browser launcher
//! - The authorization flow and the authenticated session
//! - The Spotify Web API client and playback adapter
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements the traits defined in `nadctl-common`
//! - Depends on `nadctl-domain` for errors, configuration and player types
//! - Contains all "impure" code (sockets, HTTP, processes, files)

pub mod auth;
pub mod config;
pub mod errors;
pub mod observability;
pub mod session;
pub mod spotify;

// Re-export commonly used items
pub use auth::{Authenticator, BrowserLauncher, CallbackServer, SystemBrowser};
pub use observability::init_tracing;
pub use session::Session;
pub use spotify::{Player, SpotifyApi, SpotifyApiError, SpotifyService};
