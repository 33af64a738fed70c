//! Playback adapter
//!
//! Every call checks the session is connected, refreshes the token when it is
//! about to expire and then issues one Web API request. Upstream failures are
//! reported with the name of the operation that failed.

use std::sync::Arc;

use nadctl_domain::{Device, NadError, PlaybackState, RepeatMode, Result, Track};
use tracing::{debug, instrument};

use super::client::SpotifyApi;
use crate::errors::upstream_error;
use crate::session::Session;

/// Remote control for the account's Spotify player.
#[derive(Debug, Clone)]
pub struct Player {
    session: Arc<Session>,
}

impl Player {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    async fn connected_api(&self) -> Result<SpotifyApi> {
        if !self.session.is_connected().await {
            return Err(NadError::NotConnected);
        }
        self.session.refresh_if_needed().await?;
        self.session.api().await
    }

    /// # Errors
    /// `NothingPlaying` if no track is loaded.
    #[instrument(skip(self))]
    pub async fn current_track(&self) -> Result<Track> {
        let api = self.connected_api().await?;
        let response =
            api.currently_playing().await.map_err(|e| upstream_error("get current track", e))?;

        let Some(response) = response else {
            return Err(NadError::NothingPlaying);
        };
        let Some(item) = response.item else {
            return Err(NadError::NothingPlaying);
        };
        Ok(item.into_track(response.progress_ms, response.is_playing))
    }

    #[instrument(skip(self))]
    pub async fn devices(&self) -> Result<Vec<Device>> {
        let api = self.connected_api().await?;
        let devices = api.devices().await.map_err(|e| upstream_error("list devices", e))?;
        Ok(devices.into_iter().map(Device::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn transfer_playback(&self, device_id: &str, start_playing: bool) -> Result<()> {
        let api = self.connected_api().await?;
        api.transfer_playback(device_id, start_playing)
            .await
            .map_err(|e| upstream_error("transfer playback", e))
    }

    /// Snapshot of the active session, with the device list filled in.
    ///
    /// # Errors
    /// `NoActivePlayback` if no device is playing for the account.
    #[instrument(skip(self))]
    pub async fn playback_state(&self) -> Result<PlaybackState> {
        let api = self.connected_api().await?;
        let playback = api
            .playback()
            .await
            .map_err(|e| upstream_error("get playback state", e))?
            .ok_or(NadError::NoActivePlayback)?;

        let available_devices = self.devices().await?;

        let repeat = playback.repeat_mode();
        let (device_name, device_id, volume) = match playback.device {
            Some(device) => {
                let device = Device::from(device);
                (device.display_name, device.id, device.volume_percent)
            }
            None => (String::new(), String::new(), 0),
        };
        let progress_ms = playback.progress_ms.unwrap_or_default();
        let track = playback.item.map(|item| item.into_track(Some(progress_ms), playback.is_playing));
        let duration_ms = track.as_ref().map_or(0, |t| t.duration_ms);

        Ok(PlaybackState {
            track,
            device_name,
            device_id,
            available_devices,
            volume,
            is_playing: playback.is_playing,
            shuffle: playback.shuffle_state,
            repeat,
            progress_ms,
            duration_ms,
        })
    }

    #[instrument(skip(self))]
    pub async fn play(&self) -> Result<()> {
        let api = self.connected_api().await?;
        api.play().await.map_err(|e| upstream_error("start playback", e))
    }

    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<()> {
        let api = self.connected_api().await?;
        api.pause().await.map_err(|e| upstream_error("pause playback", e))
    }

    #[instrument(skip(self))]
    pub async fn next(&self) -> Result<()> {
        let api = self.connected_api().await?;
        api.next().await.map_err(|e| upstream_error("skip to next track", e))
    }

    #[instrument(skip(self))]
    pub async fn previous(&self) -> Result<()> {
        let api = self.connected_api().await?;
        api.previous().await.map_err(|e| upstream_error("skip to previous track", e))
    }

    /// Set the volume, clamped to `0..=100`.
    #[instrument(skip(self))]
    pub async fn set_volume(&self, volume: i32) -> Result<()> {
        let clamped = clamp_volume(volume);
        if i32::from(clamped) != volume {
            debug!(requested = volume, clamped, "volume clamped");
        }
        let api = self.connected_api().await?;
        api.set_volume(clamped).await.map_err(|e| upstream_error("set volume", e))
    }

    /// Flip shuffle and return the new setting.
    #[instrument(skip(self))]
    pub async fn toggle_shuffle(&self) -> Result<bool> {
        let api = self.connected_api().await?;
        let playback = api
            .playback()
            .await
            .map_err(|e| upstream_error("get playback state", e))?
            .ok_or(NadError::NoActivePlayback)?;

        let shuffle = !playback.shuffle_state;
        api.set_shuffle(shuffle).await.map_err(|e| upstream_error("set shuffle", e))?;
        Ok(shuffle)
    }

    /// Advance repeat `off → context → track → off` and return the new mode.
    #[instrument(skip(self))]
    pub async fn cycle_repeat(&self) -> Result<RepeatMode> {
        let api = self.connected_api().await?;
        let playback = api
            .playback()
            .await
            .map_err(|e| upstream_error("get playback state", e))?
            .ok_or(NadError::NoActivePlayback)?;

        let mode = playback.repeat_mode().next();
        api.set_repeat(mode).await.map_err(|e| upstream_error("set repeat mode", e))?;
        Ok(mode)
    }
}

fn clamp_volume(volume: i32) -> u8 {
    // Lossless after the clamp.
    volume.clamp(0, 100) as u8
}
