//! Spotify Web API client
//!
//! A thin reqwest wrapper bound to one access token: the token is installed
//! as a default `Authorization` header when the client is built, so a new
//! client is built whenever the token changes. One attempt per request.

use std::time::Duration;

use nadctl_domain::constants::API_HTTP_TIMEOUT_SECS;
use nadctl_domain::RepeatMode;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::errors::SpotifyApiError;
use super::models::{CurrentlyPlayingResponse, DeviceObject, DevicesResponse, PlaybackResponse};

/// Web API client authenticated with a fixed bearer token
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl SpotifyApi {
    /// Build a client for `base_url` sending `access_token` on every request.
    ///
    /// # Errors
    /// Returns `SpotifyApiError::Config` if the token is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, SpotifyApiError> {
        let timeout = Duration::from_secs(API_HTTP_TIMEOUT_SECS);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|e| SpotifyApiError::Config(format!("invalid access token: {e}")))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let builder = Client::builder().timeout(timeout).default_headers(headers);
        let builder = if std::env::var_os("NADCTL_DISABLE_PROXY").is_some() {
            builder.no_proxy()
        } else {
            builder
        };
        let http = builder
            .build()
            .map_err(|e| SpotifyApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), timeout })
    }

    /// `None` when nothing is playing (204 or no item).
    #[instrument(skip(self))]
    pub async fn currently_playing(
        &self,
    ) -> Result<Option<CurrentlyPlayingResponse>, SpotifyApiError> {
        self.get_json("/me/player/currently-playing").await
    }

    #[instrument(skip(self))]
    pub async fn devices(&self) -> Result<Vec<DeviceObject>, SpotifyApiError> {
        let response: Option<DevicesResponse> = self.get_json("/me/player/devices").await?;
        Ok(response.map(|r| r.devices).unwrap_or_default())
    }

    /// `None` when there is no active playback session.
    #[instrument(skip(self))]
    pub async fn playback(&self) -> Result<Option<PlaybackResponse>, SpotifyApiError> {
        self.get_json("/me/player").await
    }

    #[instrument(skip(self))]
    pub async fn transfer_playback(
        &self,
        device_id: &str,
        play: bool,
    ) -> Result<(), SpotifyApiError> {
        let body = serde_json::json!({ "device_ids": [device_id], "play": play });
        self.send(self.request(Method::PUT, "/me/player").json(&body), "/me/player").await
    }

    #[instrument(skip(self))]
    pub async fn play(&self) -> Result<(), SpotifyApiError> {
        self.send_empty(Method::PUT, "/me/player/play", &[]).await
    }

    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<(), SpotifyApiError> {
        self.send_empty(Method::PUT, "/me/player/pause", &[]).await
    }

    #[instrument(skip(self))]
    pub async fn next(&self) -> Result<(), SpotifyApiError> {
        self.send_empty(Method::POST, "/me/player/next", &[]).await
    }

    #[instrument(skip(self))]
    pub async fn previous(&self) -> Result<(), SpotifyApiError> {
        self.send_empty(Method::POST, "/me/player/previous", &[]).await
    }

    #[instrument(skip(self))]
    pub async fn set_volume(&self, volume_percent: u8) -> Result<(), SpotifyApiError> {
        let volume = volume_percent.to_string();
        self.send_empty(Method::PUT, "/me/player/volume", &[("volume_percent", &volume)]).await
    }

    #[instrument(skip(self))]
    pub async fn set_shuffle(&self, state: bool) -> Result<(), SpotifyApiError> {
        let state = if state { "true" } else { "false" };
        self.send_empty(Method::PUT, "/me/player/shuffle", &[("state", state)]).await
    }

    #[instrument(skip(self))]
    pub async fn set_repeat(&self, mode: RepeatMode) -> Result<(), SpotifyApiError> {
        self.send_empty(Method::PUT, "/me/player/repeat", &[("state", mode.as_str())]).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SpotifyApiError> {
        debug!(path, "GET request");
        let response = self.request(Method::GET, path).send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, path, &body));
        }

        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SpotifyApiError::Parse(format!("{path}: {e}")))
    }

    async fn send_empty(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(), SpotifyApiError> {
        // Empty body so a Content-Length is sent; the player endpoints answer
        // 411 without one.
        let request = self.request(method, path).query(query).body("");
        self.send(request, path).await
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<(), SpotifyApiError> {
        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, path, &body));
        }

        debug!(path, status = status.as_u16(), "request successful");
        Ok(())
    }

    fn map_send_error(&self, err: reqwest::Error) -> SpotifyApiError {
        if err.is_timeout() {
            SpotifyApiError::Timeout(self.timeout)
        } else {
            SpotifyApiError::Network(err.to_string())
        }
    }

    fn map_status_error(status: StatusCode, path: &str, body: &str) -> SpotifyApiError {
        let message = if body.is_empty() {
            format!("{path} returned status {status}")
        } else {
            format!("{path} returned status {status}: {body}")
        };

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            SpotifyApiError::Auth(message)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            SpotifyApiError::RateLimit(message)
        } else if status.is_server_error() {
            SpotifyApiError::Server(message)
        } else {
            SpotifyApiError::Client(message)
        }
    }
}
