//! Shared helpers for infra integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use nadctl_common::auth::{OAuthClient, OAuthConfig};
use nadctl_domain::constants::SPOTIFY_SCOPES;
use nadctl_domain::{NadError, Result};
use nadctl_infra::auth::BrowserLauncher;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "abc";

/// Unused loopback port. The listener is dropped before returning.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("ephemeral bind should succeed")
        .local_addr()
        .expect("bound listener has an address")
        .port()
}

pub fn redirect_uri(port: u16) -> String {
    format!("http://127.0.0.1:{port}/callback")
}

/// What the simulated user does in the browser.
#[derive(Debug, Clone)]
pub enum BrowserAction {
    /// Approve; the provider redirects with `code` and the state it was sent
    Approve { code: String },
    /// Approve, but the redirect carries a different state
    ApproveWithState { code: String, state: String },
    /// Deny; the provider redirects with `error`
    Deny { error: String },
}

/// Browser stand-in that performs the provider redirect against the
/// callback server.
pub struct CallbackBrowser {
    redirect_uri: String,
    action: BrowserAction,
    opened: Mutex<Vec<String>>,
}

impl CallbackBrowser {
    pub fn new(redirect_uri: &str, action: BrowserAction) -> Arc<Self> {
        Arc::new(Self {
            redirect_uri: redirect_uri.to_string(),
            action,
            opened: Mutex::new(Vec::new()),
        })
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl BrowserLauncher for CallbackBrowser {
    fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());

        let authorize =
            Url::parse(url).map_err(|e| NadError::BrowserLaunchFailed(e.to_string()))?;
        let sent_state = authorize
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        let mut callback = Url::parse(&self.redirect_uri)
            .map_err(|e| NadError::BrowserLaunchFailed(e.to_string()))?;
        match &self.action {
            BrowserAction::Approve { code } => {
                callback.query_pairs_mut().append_pair("code", code).append_pair("state", &sent_state);
            }
            BrowserAction::ApproveWithState { code, state } => {
                callback.query_pairs_mut().append_pair("code", code).append_pair("state", state);
            }
            BrowserAction::Deny { error } => {
                callback.query_pairs_mut().append_pair("error", error);
            }
        }

        tokio::spawn(async move {
            let client = reqwest::Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("test HTTP client");
            let _ = client.get(callback).send().await;
        });
        Ok(())
    }
}

pub fn token_body(access_token: &str, refresh_token: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600,
        "scope": SPOTIFY_SCOPES.join(" "),
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = serde_json::Value::String(refresh_token.to_string());
    }
    body
}

/// Mount a token endpoint answering `grant_type` requests with `response`.
pub async fn mount_token_endpoint(server: &MockServer, grant_type: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains(format!("grant_type={grant_type}")))
        .respond_with(response)
        .mount(server)
        .await;
}

/// OAuth client pointed at `server` and redirecting to `redirect_uri`.
pub fn oauth_client(server: &MockServer, redirect_uri: &str) -> Arc<OAuthClient> {
    std::env::set_var("NADCTL_DISABLE_PROXY", "1");
    Arc::new(OAuthClient::new(OAuthConfig::new(
        CLIENT_ID.to_string(),
        redirect_uri.to_string(),
        SPOTIFY_SCOPES.iter().map(|s| (*s).to_string()).collect(),
        format!("{}/authorize", server.uri()),
        format!("{}/api/token", server.uri()),
    )))
}
