//! Spotify Web API response shapes and their mapping to domain types.
//!
//! Only the fields nadctl reads are declared; everything else in the
//! upstream JSON is ignored.

use nadctl_domain::{Device, RepeatMode, Track};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistObject {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageObject {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumObject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<ImageObject>,
}

/// Track (or episode) item
#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
    #[serde(default)]
    pub album: AlbumObject,
}

/// `GET /me/player/currently-playing`
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlayingResponse {
    #[serde(default)]
    pub is_playing: bool,
    pub progress_ms: Option<u64>,
    pub item: Option<TrackObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceObject {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_restricted: bool,
    pub volume_percent: Option<u32>,
}

/// `GET /me/player/devices`
#[derive(Debug, Clone, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<DeviceObject>,
}

/// `GET /me/player`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackResponse {
    pub device: Option<DeviceObject>,
    #[serde(default)]
    pub shuffle_state: bool,
    #[serde(default)]
    pub repeat_state: String,
    #[serde(default)]
    pub is_playing: bool,
    pub progress_ms: Option<u64>,
    pub item: Option<TrackObject>,
}

impl PlaybackResponse {
    /// Unknown repeat states read as `off`.
    #[must_use]
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_state.parse().unwrap_or_default()
    }
}

impl TrackObject {
    #[must_use]
    pub fn into_track(self, progress_ms: Option<u64>, is_playing: bool) -> Track {
        let artist = self.artists.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ");
        let album_art_url = self.album.images.into_iter().next().map(|image| image.url);

        Track {
            id: self.id.unwrap_or_default(),
            name: self.name,
            artist,
            album: self.album.name,
            album_art_url,
            duration_ms: self.duration_ms,
            progress_ms: progress_ms.unwrap_or_default(),
            is_playing,
        }
    }
}

impl From<DeviceObject> for Device {
    fn from(device: DeviceObject) -> Self {
        Self {
            id: device.id.unwrap_or_default(),
            display_name: device.name,
            kind: device.kind,
            is_active: device.is_active,
            is_restricted: device.is_restricted,
            volume_percent: device.volume_percent.unwrap_or_default().min(100) as u8,
        }
    }
}
