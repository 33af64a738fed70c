//! Domain types and models

pub mod player;

// Re-export player types for convenience
pub use player::{Device, PlaybackState, RepeatMode, Track};
