//! Loopback HTTP server that receives the OAuth redirect.
//!
//! The server binds the host and port named in the redirect URI, serves a
//! single route at its path and hands whatever the browser delivered to the
//! waiting flow through a [`rendezvous`](super::rendezvous). One mutex guards
//! both the running server and the rendezvous sender, so `start` and `stop`
//! are serialized and the two are installed and removed together.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{BoxError, Router};
use nadctl_domain::constants::{
    CALLBACK_PUBLISH_DEADLINE_SECS, CALLBACK_HANDLER_TIMEOUT_SECS, CALLBACK_SHUTDOWN_GRACE_SECS,
    CALLBACK_WARMUP_MS, DEFAULT_CALLBACK_HOST, DEFAULT_CALLBACK_PATH, DEFAULT_CALLBACK_PORT,
};
use nadctl_domain::{NadError, Result};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tracing::{debug, error, info, warn};
use url::{form_urlencoded, Url};

use super::rendezvous::{rendezvous, AuthResult, RendezvousReceiver, RendezvousSender};

/// Where the redirect lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl RedirectTarget {
    /// Parse a redirect URI, defaulting host, port and path when absent.
    ///
    /// # Errors
    /// Returns `NadError::InvalidRedirect` if the URI does not parse.
    pub fn parse(redirect_uri: &str) -> Result<Self> {
        let url = Url::parse(redirect_uri)
            .map_err(|e| NadError::InvalidRedirect(format!("{redirect_uri}: {e}")))?;

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.trim_matches(['[', ']']).to_string(),
            _ => DEFAULT_CALLBACK_HOST.to_string(),
        };
        let path = match url.path() {
            "" | "/" => DEFAULT_CALLBACK_PATH.to_string(),
            path => path.to_string(),
        };

        Ok(Self { host, port: url.port().unwrap_or(DEFAULT_CALLBACK_PORT), path })
    }
}

struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RunningServer {
    /// Signal graceful shutdown and wait for the serve task, aborting it once
    /// the grace period is over.
    async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        let Some(mut handle) = self.handle.take() else {
            return;
        };
        let grace = Duration::from_secs(CALLBACK_SHUTDOWN_GRACE_SECS);
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => debug!(addr = %self.addr, "callback server stopped"),
            Ok(Err(err)) if err.is_panic() => error!(error = %err, "callback server task panicked"),
            Ok(Err(_)) => {}
            Err(_) => {
                warn!(addr = %self.addr, "callback server did not stop in time; aborting");
                handle.abort();
            }
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

#[derive(Default)]
struct CallbackState {
    server: Option<RunningServer>,
    rendezvous: Option<RendezvousSender>,
}

impl CallbackState {
    fn take_server(&mut self) -> Option<RunningServer> {
        // Dropping the sender closes the channel and wakes the waiter.
        self.rendezvous = None;
        self.server.take()
    }
}

type SharedState = Arc<Mutex<CallbackState>>;

/// Loopback callback server.
pub struct CallbackServer {
    redirect_uri: String,
    state: SharedState,
}

impl CallbackServer {
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self { redirect_uri: redirect_uri.into(), state: Arc::new(Mutex::new(CallbackState::default())) }
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Bind, start serving and return the waiting end of a fresh rendezvous.
    ///
    /// A run already in progress is stopped first. The rendezvous is only
    /// installed after the listener is bound and the serve task has had a
    /// moment to start.
    ///
    /// # Errors
    /// - `NadError::InvalidRedirect` if the redirect URI does not parse
    /// - `NadError::PortBusy` if the port is taken
    /// - `NadError::Network` for any other bind failure
    pub async fn start(&self) -> Result<RendezvousReceiver> {
        let target = RedirectTarget::parse(&self.redirect_uri)?;
        let mut guard = self.state.lock().await;

        if let Some(previous) = guard.take_server() {
            debug!("stopping previous callback server run");
            previous.shutdown().await;
        }

        let listener =
            TcpListener::bind((target.host.as_str(), target.port)).await.map_err(|err| {
                let addr = format!("{}:{}", target.host, target.port);
                if err.kind() == io::ErrorKind::AddrInUse {
                    NadError::PortBusy(addr)
                } else {
                    NadError::Network(format!("failed to bind callback server on {addr}: {err}"))
                }
            })?;
        let addr = listener
            .local_addr()
            .map_err(|err| NadError::Network(format!("failed to determine local address: {err}")))?;

        let app = callback_router(&target.path, self.state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("OAuth callback server error: {}", err);
            }
        });
        guard.server =
            Some(RunningServer { addr, shutdown_tx: Some(shutdown_tx), handle: Some(handle) });

        tokio::time::sleep(Duration::from_millis(CALLBACK_WARMUP_MS)).await;

        let (tx, rx) = rendezvous();
        guard.rendezvous = Some(tx);
        info!(%addr, path = %target.path, "callback server listening");

        Ok(rx)
    }

    /// Stop serving and close the rendezvous. Idempotent.
    pub async fn stop(&self) {
        let server = self.state.lock().await.take_server();
        if let Some(server) = server {
            server.shutdown().await;
        }
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.server.is_some()
    }

    /// Synchronous teardown for drop paths: signal shutdown, abort the task
    /// and close the rendezvous. Falls back to an async stop if the state is
    /// busy.
    fn stop_now(self: &Arc<Self>) {
        match self.state.try_lock() {
            Ok(mut guard) => drop(guard.take_server()),
            Err(_) => {
                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    let server = Arc::clone(self);
                    runtime.spawn(async move { server.stop().await });
                }
            }
        }
    }
}

/// Stops the callback server when an authorization attempt ends, however it
/// ends.
pub struct CallbackGuard {
    server: Arc<CallbackServer>,
    released: bool,
}

impl CallbackGuard {
    pub fn new(server: Arc<CallbackServer>) -> Self {
        Self { server, released: false }
    }

    /// Stop the server gracefully.
    pub async fn release(mut self) {
        self.released = true;
        self.server.stop().await;
    }
}

impl Drop for CallbackGuard {
    fn drop(&mut self) {
        if !self.released {
            self.server.stop_now();
        }
    }
}

fn callback_router(path: &str, state: SharedState) -> Router {
    Router::new().route(path, get(handle_callback)).with_state(state).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: BoxError| async { StatusCode::REQUEST_TIMEOUT }))
            .timeout(Duration::from_secs(CALLBACK_HANDLER_TIMEOUT_SECS)),
    )
}

#[derive(Debug, Default)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl CallbackParams {
    /// Read the redirect parameters leniently: the first occurrence of each
    /// key wins and anything unrecognized is ignored.
    fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

// Every request to the callback path gets an HTML page; malformed query
// strings are classified rather than rejected by an extractor.
async fn handle_callback(
    State(shared): State<SharedState>,
    RawQuery(query): RawQuery,
) -> Html<String> {
    let (page, result) = classify(CallbackParams::from_query(query.as_deref().unwrap_or_default()));

    let sender = shared.lock().await.rendezvous.clone();
    match sender {
        Some(sender) => {
            let deadline = Duration::from_secs(CALLBACK_PUBLISH_DEADLINE_SECS);
            if !sender.publish_within(result, deadline).await {
                warn!("authorization result dropped: already delivered or nobody waiting");
            }
        }
        None => warn!("authorization callback received with no flow in progress"),
    }

    Html(page)
}

fn classify(params: CallbackParams) -> (String, AuthResult) {
    if let Some(error) = params.error {
        debug!(%error, "authorization callback reported an error");
        let page = error_page(&error);
        return (page, AuthResult::Error(format!("authentication error: {error}")));
    }

    match (params.code, params.state) {
        (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => {
            (SUCCESS_PAGE.to_string(), AuthResult::Code { code, state })
        }
        _ => (
            INVALID_PAGE.to_string(),
            AuthResult::Error("no authorization code received".to_string()),
        ),
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>nadctl - Authorization Complete</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 4em;">
<h1>Authorization Successful</h1>
<p>nadctl is now connected to Spotify.</p>
<p>This window will close in <span id="countdown">3</span> seconds.</p>
<script>
  var remaining = 3;
  var timer = setInterval(function () {
    remaining -= 1;
    document.getElementById("countdown").textContent = remaining;
    if (remaining <= 0) {
      clearInterval(timer);
      window.close();
    }
  }, 1000);
</script>
</body>
</html>"#;

const INVALID_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>nadctl - Authorization Failed</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 4em;">
<h1>Authorization Failed</h1>
<p>No authorization code was received. Please try again from nadctl.</p>
</body>
</html>"#;

fn error_page(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>nadctl - Authorization Failed</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 4em;">
<h1>Authorization Failed</h1>
<p>Spotify reported: <code>{}</code></p>
<p>You can close this window and try again.</p>
</body>
</html>"#,
        escape_html(error)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(str::to_string),
            state: state.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn redirect_target_defaults() {
        let target = RedirectTarget::parse("http://localhost:8888/callback").unwrap();
        assert_eq!(
            target,
            RedirectTarget { host: "localhost".into(), port: 8888, path: "/callback".into() }
        );

        let target = RedirectTarget::parse("http://127.0.0.1").unwrap();
        assert_eq!(target.port, 8888);
        assert_eq!(target.path, "/callback");

        let target = RedirectTarget::parse("http://[::1]:9000/cb").unwrap();
        assert_eq!(target.host, "::1");
        assert_eq!(target.port, 9000);
        assert_eq!(target.path, "/cb");
    }

    #[test]
    fn redirect_target_rejects_garbage() {
        assert!(matches!(
            RedirectTarget::parse("not a uri"),
            Err(NadError::InvalidRedirect(_))
        ));
    }

    #[test]
    fn error_takes_precedence_over_code() {
        let (page, result) = classify(params(Some("c"), Some("s"), Some("access_denied")));
        assert_eq!(result, AuthResult::Error("authentication error: access_denied".into()));
        assert!(page.contains("access_denied"));
    }

    #[test]
    fn code_and_state_yield_success() {
        let (page, result) = classify(params(Some("XYZ"), Some("nadctl-state"), None));
        assert_eq!(result, AuthResult::Code { code: "XYZ".into(), state: "nadctl-state".into() });
        assert!(page.contains("window.close()"));
        assert!(page.contains("id=\"countdown\">3<"));
    }

    #[test]
    fn missing_or_empty_values_are_invalid() {
        for p in [
            params(None, None, None),
            params(Some("c"), None, None),
            params(Some(""), Some("s"), None),
            params(Some("c"), Some(""), None),
        ] {
            let (page, result) = classify(p);
            assert_eq!(result, AuthResult::Error("no authorization code received".into()));
            assert_eq!(page, INVALID_PAGE);
        }
    }

    #[test]
    fn first_query_value_wins() {
        let parsed = CallbackParams::from_query("code=a&code=b&state=s&state=t&extra=1");
        assert_eq!(parsed.code.as_deref(), Some("a"));
        assert_eq!(parsed.state.as_deref(), Some("s"));
        assert!(parsed.error.is_none());

        let parsed = CallbackParams::from_query("error=access%20denied&error=x");
        assert_eq!(parsed.error.as_deref(), Some("access denied"));

        let parsed = CallbackParams::from_query("%zz&&=&code");
        assert_eq!(parsed.code.as_deref(), Some(""));
        assert!(parsed.state.is_none());
    }

    #[test]
    fn error_page_escapes_markup() {
        let page = error_page("<script>alert('x')</script>");
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
    }

    async fn get_callback(base: &str, query: &str) -> reqwest::Response {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        client.get(format!("{base}{query}")).send().await.unwrap()
    }

    #[tokio::test]
    async fn duplicate_parameters_are_answered_with_html() {
        let base = format!("http://127.0.0.1:{}/callback", free_port());
        let server = CallbackServer::new(&base);
        let rx = server.start().await.unwrap();

        let response = get_callback(&base, "?code=a&code=b&state=s").await;

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let content_type = response.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"), "unexpected content type: {content_type}");
        assert!(response.text().await.unwrap().contains("Authorization Successful"));

        let result = rx.wait(Duration::from_secs(2)).await.unwrap();
        assert_eq!(result, AuthResult::Code { code: "a".into(), state: "s".into() });
        server.stop().await;
    }

    #[tokio::test]
    async fn malformed_query_publishes_missing_code() {
        let base = format!("http://127.0.0.1:{}/callback", free_port());
        let server = CallbackServer::new(&base);

        for query in ["", "?%zz=%&state", "?code=&state=s"] {
            let rx = server.start().await.unwrap();

            let response = get_callback(&base, query).await;
            assert_eq!(response.status(), reqwest::StatusCode::OK);
            assert!(response.text().await.unwrap().contains("No authorization code"));

            let result = rx.wait(Duration::from_secs(2)).await.unwrap();
            assert_eq!(result, AuthResult::Error("no authorization code received".into()));
        }
        server.stop().await;
    }
}
