//! Spotify Web API integration
//!
//! - [`client`]: HTTP client for the player endpoints
//! - [`models`]: wire types and their mapping to domain types
//! - [`player`]: playback adapter on top of a [`Session`](crate::session::Session)
//! - [`service`]: facade wiring authorization, session and player together

pub mod client;
pub mod errors;
pub mod models;
pub mod player;
pub mod service;

pub use client::SpotifyApi;
pub use errors::SpotifyApiError;
pub use models::{
    AlbumObject, ArtistObject, CurrentlyPlayingResponse, DeviceObject, DevicesResponse,
    ImageObject, PlaybackResponse, TrackObject,
};
pub use player::Player;
pub use service::SpotifyService;
