//! Playback and device types
//!
//! These are the shapes handed to callers of the playback adapter. They are
//! decoupled from the Spotify wire format, which lives in the infra crate.

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// A Spotify Connect device available to the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Device identifier (empty when the upstream withholds it)
    pub id: String,
    pub display_name: String,
    /// Device kind as reported upstream ("Computer", "Speaker", ...)
    pub kind: String,
    pub is_active: bool,
    pub is_restricted: bool,
    /// Volume in the range `0..=100`
    pub volume_percent: u8,
}

/// The currently playing track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    /// Artist names joined with `", "` in upstream order
    pub artist: String,
    pub album: String,
    /// First album image, usually the largest
    pub album_art_url: Option<String>,
    pub duration_ms: u64,
    pub progress_ms: u64,
    pub is_playing: bool,
}

/// Repeat mode of the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    Track,
    Context,
}

impl_domain_status_conversions!(RepeatMode {
    Off => "off",
    Track => "track",
    Context => "context",
});

impl RepeatMode {
    /// Next mode in the `off → context → track → off` cycle.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Context,
            Self::Context => Self::Track,
            Self::Track => Self::Off,
        }
    }

    /// Wire representation used by the upstream repeat endpoint.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Track => "track",
            Self::Context => "context",
        }
    }
}

/// Snapshot of the active playback session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub track: Option<Track>,
    pub device_name: String,
    pub device_id: String,
    pub available_devices: Vec<Device>,
    pub volume: u8,
    pub is_playing: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub progress_ms: u64,
    pub duration_ms: u64,
}

impl PlaybackState {
    /// The device currently marked active, if it is in the device list.
    #[must_use]
    pub fn active_device(&self) -> Option<&Device> {
        self.available_devices.iter().find(|device| device.is_active)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn repeat_mode_cycles_off_context_track() {
        assert_eq!(RepeatMode::Off.next(), RepeatMode::Context);
        assert_eq!(RepeatMode::Context.next(), RepeatMode::Track);
        assert_eq!(RepeatMode::Track.next(), RepeatMode::Off);
    }

    #[test]
    fn repeat_mode_parses_case_insensitively() {
        assert_eq!(RepeatMode::from_str("CONTEXT").unwrap(), RepeatMode::Context);
        assert_eq!(RepeatMode::from_str("track").unwrap(), RepeatMode::Track);
        assert!(RepeatMode::from_str("shuffle").is_err());
    }

    #[test]
    fn repeat_mode_serializes_lowercase() {
        let json = serde_json::to_string(&RepeatMode::Context).unwrap();
        assert_eq!(json, "\"context\"");
        assert_eq!(RepeatMode::Track.to_string(), RepeatMode::Track.as_str());
    }

    #[test]
    fn active_device_is_found() {
        let device = |id: &str, active: bool| Device {
            id: id.to_string(),
            display_name: format!("Device {id}"),
            kind: "Speaker".to_string(),
            is_active: active,
            is_restricted: false,
            volume_percent: 40,
        };
        let state = PlaybackState {
            track: None,
            device_name: "Device b".to_string(),
            device_id: "b".to_string(),
            available_devices: vec![device("a", false), device("b", true)],
            volume: 40,
            is_playing: false,
            shuffle: false,
            repeat: RepeatMode::Off,
            progress_ms: 0,
            duration_ms: 0,
        };

        assert_eq!(state.active_device().map(|d| d.id.as_str()), Some("b"));
    }
}
