//! Authorization Code + PKCE flow.
//!
//! One attempt runs start-server → open-browser → wait → stop-server →
//! exchange, and leaves the session connected on success. The callback
//! server is held by a [`CallbackGuard`] for the whole attempt, so it is
//! stopped on every exit path, including cancellation of the future.

use std::sync::Arc;
use std::time::Duration;

use nadctl_common::auth::{generate_state, validate_state, PkceChallenge};
use nadctl_domain::{NadError, Result, StateNonce};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::browser::BrowserLauncher;
use super::callback_server::{CallbackGuard, CallbackServer};
use super::rendezvous::{AuthResult, WaitError};
use crate::errors::{InfraError, IntoNadError};
use crate::session::Session;

/// Drives interactive authorization for a [`Session`].
pub struct Authenticator {
    session: Arc<Session>,
    callback: Arc<CallbackServer>,
    browser: Arc<dyn BrowserLauncher>,
    state_nonce: StateNonce,
    /// Authorization URL the user has to open by hand, set while an attempt
    /// whose browser launch failed is waiting.
    manual_url: Mutex<Option<String>>,
}

impl Authenticator {
    pub fn new(
        session: Arc<Session>,
        callback: Arc<CallbackServer>,
        browser: Arc<dyn BrowserLauncher>,
        state_nonce: StateNonce,
    ) -> Self {
        Self { session, callback, browser, state_nonce, manual_url: Mutex::new(None) }
    }

    /// URL to show the user when the browser could not be opened for the
    /// attempt in progress.
    pub async fn manual_authorization_url(&self) -> Option<String> {
        self.manual_url.lock().await.clone()
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Run one authorization attempt.
    ///
    /// # Errors
    /// - `PortBusy` / `InvalidRedirect` / `Network` if the callback server
    ///   cannot start; the browser is not opened
    /// - `AuthTimeout` if no callback arrives within `timeout`
    /// - `AuthInterrupted` if [`Self::cancel`] ran while waiting
    /// - `AuthError` if the provider redirected with an error
    /// - `InvalidState` if the returned state does not match
    /// - `TokenExchangeFailed` if the code could not be exchanged
    #[instrument(skip(self))]
    pub async fn authenticate(&self, timeout: Duration) -> Result<()> {
        // The deadline covers server warmup too.
        let deadline = Instant::now() + timeout;
        let pkce = PkceChallenge::generate().map_err(IntoNadError::into_nad)?;
        let state = match &self.state_nonce {
            StateNonce::Random => generate_state().map_err(IntoNadError::into_nad)?,
            StateNonce::Fixed(literal) => literal.clone(),
        };

        let receiver = self.callback.start().await?;
        let guard = CallbackGuard::new(Arc::clone(&self.callback));
        self.session.set_pending_state(Some(state.clone())).await;

        let url = self.session.exchange().authorization_url(&state, &pkce.code_challenge);
        match self.browser.open(&url) {
            Ok(()) => info!("opened browser for Spotify authorization"),
            Err(err) => {
                warn!(
                    error = %err,
                    %url,
                    "could not open a browser; open this URL to authorize nadctl"
                );
                *self.manual_url.lock().await = Some(url);
            }
        }

        let outcome = receiver.wait(deadline.saturating_duration_since(Instant::now())).await;
        guard.release().await;
        self.session.set_pending_state(None).await;
        self.manual_url.lock().await.take();

        let code = match outcome {
            Err(WaitError::TimedOut) => return Err(NadError::AuthTimeout(timeout)),
            Err(WaitError::Cancelled) => return Err(NadError::AuthInterrupted),
            Ok(AuthResult::Error(message)) => {
                warn!(%message, "authorization rejected");
                return Err(NadError::AuthError(message));
            }
            Ok(AuthResult::Code { code, state: returned }) => {
                if !validate_state(&state, &returned) {
                    warn!("state nonce mismatch on callback");
                    return Err(NadError::InvalidState);
                }
                code
            }
        };

        debug!("exchanging authorization code");
        let token = self
            .session
            .exchange()
            .exchange_code(&code, &pkce.code_verifier)
            .await
            .map_err(|e| NadError::from(InfraError::from(e)))?;

        self.session.install_and_persist(token).await?;
        info!("Spotify authorization complete");
        Ok(())
    }

    /// Abort a waiting attempt; it returns `AuthInterrupted`.
    pub async fn cancel(&self) {
        self.callback.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use nadctl_common::testing::{MemoryTokenCache, MockTokenExchange};

    use super::*;

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
    }

    /// Records URLs; never calls back.
    #[derive(Default)]
    struct SilentBrowser {
        opened: Mutex<Vec<String>>,
    }

    impl BrowserLauncher for SilentBrowser {
        fn open(&self, url: &str) -> Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct BrokenBrowser;

    impl BrowserLauncher for BrokenBrowser {
        fn open(&self, _url: &str) -> Result<()> {
            Err(NadError::BrowserLaunchFailed("no display".into()))
        }
    }

    fn authenticator(
        port: u16,
        browser: Arc<dyn BrowserLauncher>,
    ) -> (Authenticator, Arc<MockTokenExchange>) {
        let exchange = Arc::new(MockTokenExchange::new("abc"));
        let redirect = format!("http://127.0.0.1:{port}/callback");
        let session = Arc::new(Session::new(
            exchange.clone(),
            Arc::new(MemoryTokenCache::new()),
            redirect.clone(),
            "http://127.0.0.1:1",
        ));
        let callback = Arc::new(CallbackServer::new(redirect));
        (Authenticator::new(session, callback, browser, StateNonce::Random), exchange)
    }

    #[tokio::test]
    async fn times_out_and_stops_server() {
        let browser = Arc::new(SilentBrowser::default());
        let (auth, exchange) = authenticator(free_port(), browser.clone());

        let err = auth.authenticate(Duration::from_millis(200)).await.unwrap_err();

        assert_eq!(err, NadError::AuthTimeout(Duration::from_millis(200)));
        assert!(!auth.callback.is_running().await);
        assert_eq!(auth.session.pending_state().await, None);
        assert_eq!(exchange.exchange_count(), 0);
        assert_eq!(browser.opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn browser_failure_is_not_fatal() {
        let (auth, _) = authenticator(free_port(), Arc::new(BrokenBrowser));

        let err = auth.authenticate(Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, NadError::AuthTimeout(_)));
        assert_eq!(auth.manual_authorization_url().await, None);
    }

    #[tokio::test]
    async fn browser_failure_exposes_url_while_waiting() {
        let (auth, _) = authenticator(free_port(), Arc::new(BrokenBrowser));
        let auth = Arc::new(auth);

        let waiting = {
            let auth = auth.clone();
            tokio::spawn(async move { auth.authenticate(Duration::from_secs(10)).await })
        };
        let url = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(url) = auth.manual_authorization_url().await {
                    break url;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("manual URL should be published");

        assert!(url.contains("code_challenge="));
        assert!(url.contains("client_id=abc"));

        auth.cancel().await;
        assert_eq!(waiting.await.unwrap(), Err(NadError::AuthInterrupted));
        assert_eq!(auth.manual_authorization_url().await, None);
    }

    #[tokio::test]
    async fn launched_browser_leaves_no_manual_url() {
        let browser = Arc::new(SilentBrowser::default());
        let (auth, _) = authenticator(free_port(), browser.clone());
        let auth = Arc::new(auth);

        let waiting = {
            let auth = auth.clone();
            tokio::spawn(async move { auth.authenticate(Duration::from_secs(10)).await })
        };
        while browser.opened.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(auth.manual_authorization_url().await, None);
        auth.cancel().await;
        assert_eq!(waiting.await.unwrap(), Err(NadError::AuthInterrupted));
    }

    #[tokio::test]
    async fn cancel_interrupts_waiting_attempt() {
        let (auth, _) = authenticator(free_port(), Arc::new(SilentBrowser::default()));
        let auth = Arc::new(auth);

        let waiting = {
            let auth = auth.clone();
            tokio::spawn(async move { auth.authenticate(Duration::from_secs(10)).await })
        };
        while !auth.callback.is_running().await {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(400)).await;
        auth.cancel().await;

        assert_eq!(waiting.await.unwrap(), Err(NadError::AuthInterrupted));
    }

    #[tokio::test]
    async fn busy_port_fails_before_browser_opens() {
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = blocker.local_addr().unwrap().port();
        let browser = Arc::new(SilentBrowser::default());
        let (auth, _) = authenticator(port, browser.clone());

        let err = auth.authenticate(Duration::from_secs(1)).await.unwrap_err();

        assert!(matches!(err, NadError::PortBusy(_)));
        assert!(browser.opened.lock().unwrap().is_empty());
        drop(blocker);
    }
}
