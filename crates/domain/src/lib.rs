//! # nadctl Domain
//!
//! Domain types and models for the nadctl Spotify integration.
//!
//! This crate contains:
//! - Playback domain types (Device, Track, PlaybackState, RepeatMode)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other nadctl crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
