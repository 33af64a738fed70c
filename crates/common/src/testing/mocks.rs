//! Mock implementations of the auth traits
//!
//! In-memory stand-ins for [`TokenCache`] and [`TokenExchange`] that count
//! calls and can be told to fail.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::auth::{
    OAuthClientError, OAuthError, TokenCache, TokenCacheError, TokenExchange, TokenRecord,
};

/// In-memory token cache
///
/// # Examples
///
/// ```
/// use nadctl_common::auth::TokenCache;
/// use nadctl_common::testing::fixtures::valid_token;
/// use nadctl_common::testing::mocks::MemoryTokenCache;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let cache = MemoryTokenCache::new();
///     cache.save(&valid_token("abc")).await.unwrap();
///     assert!(cache.stored().is_some());
///     assert_eq!(cache.save_count(), 1);
/// });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenCache {
    record: Arc<Mutex<Option<TokenRecord>>>,
    saves: Arc<AtomicUsize>,
    clears: Arc<AtomicUsize>,
    fail_load: Arc<AtomicBool>,
    fail_save: Arc<AtomicBool>,
    fail_clear: Arc<AtomicBool>,
}

impl MemoryTokenCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache already holding `record`
    pub fn with_record(record: TokenRecord) -> Self {
        let cache = Self::new();
        // SAFETY: Mutex poisoning is acceptable in test mocks
        *cache.record.lock().unwrap() = Some(record);
        cache
    }

    /// Current contents, bypassing the failure flags
    pub fn stored(&self) -> Option<TokenRecord> {
        self.record.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_clear(&self, fail: bool) {
        self.fail_clear.store(fail, Ordering::SeqCst);
    }
}

fn injected(op: &str) -> TokenCacheError {
    TokenCacheError::Io(io::Error::new(io::ErrorKind::PermissionDenied, format!("mock {op} failure")))
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn load(&self) -> Result<Option<TokenRecord>, TokenCacheError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(injected("load"));
        }
        Ok(self.stored())
    }

    async fn save(&self, record: &TokenRecord) -> Result<(), TokenCacheError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(injected("save"));
        }
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenCacheError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(injected("clear"));
        }
        *self.record.lock().unwrap() = None;
        Ok(())
    }
}

/// Mock token endpoint
///
/// Exchanges return `mock-access-token` / `mock-refresh-token`; refreshes
/// return `mock-refreshed-token-<n>` and keep the caller's refresh token.
/// Either call can be switched to fail with an HTTP status.
#[derive(Debug, Clone)]
pub struct MockTokenExchange {
    client_id: String,
    authorize_url: String,
    expires_in: i64,
    exchange_calls: Arc<AtomicUsize>,
    refresh_calls: Arc<AtomicUsize>,
    exchanged: Arc<Mutex<Vec<(String, String)>>>,
    exchange_failure: Arc<Mutex<Option<u16>>>,
    refresh_failure: Arc<Mutex<Option<u16>>>,
}

impl MockTokenExchange {
    /// Create a mock for `client_id` issuing one-hour tokens
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            authorize_url: "https://accounts.example.test/authorize".to_string(),
            expires_in: 3600,
            exchange_calls: Arc::new(AtomicUsize::new(0)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            exchanged: Arc::new(Mutex::new(Vec::new())),
            exchange_failure: Arc::new(Mutex::new(None)),
            refresh_failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Lifetime of issued tokens, in seconds
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: i64) -> Self {
        self.expires_in = expires_in;
        self
    }

    pub fn exchange_count(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// `(code, verifier)` pairs seen by `exchange_code`
    pub fn exchanged_codes(&self) -> Vec<(String, String)> {
        self.exchanged.lock().unwrap().clone()
    }

    pub fn fail_exchange_with(&self, status: Option<u16>) {
        *self.exchange_failure.lock().unwrap() = status;
    }

    pub fn fail_refresh_with(&self, status: Option<u16>) {
        *self.refresh_failure.lock().unwrap() = status;
    }

    fn record(&self, access_token: String, refresh_token: Option<String>) -> TokenRecord {
        TokenRecord {
            access_token,
            token_type: "Bearer".to_string(),
            refresh_token,
            expiry: Utc::now() + Duration::seconds(self.expires_in),
            client_id: self.client_id.clone(),
            scope: None,
        }
    }
}

fn status_error(status: u16) -> OAuthClientError {
    OAuthClientError::Status {
        status,
        error: Some(OAuthError {
            error: "invalid_grant".to_string(),
            error_description: Some("mock failure".to_string()),
        }),
    }
}

#[async_trait]
impl TokenExchange for MockTokenExchange {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        format!(
            "{}?client_id={}&state={}&code_challenge={}",
            self.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge)
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenRecord, OAuthClientError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.exchanged.lock().unwrap().push((code.to_string(), code_verifier.to_string()));

        if let Some(status) = *self.exchange_failure.lock().unwrap() {
            return Err(status_error(status));
        }
        Ok(self.record("mock-access-token".to_string(), Some("mock-refresh-token".to_string())))
    }

    async fn refresh_token(&self, current: &TokenRecord) -> Result<TokenRecord, OAuthClientError> {
        if !current.has_refresh_token() {
            return Err(OAuthClientError::NoRefreshToken);
        }
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(status) = *self.refresh_failure.lock().unwrap() {
            return Err(status_error(status));
        }
        Ok(self.record(format!("mock-refreshed-token-{n}"), current.refresh_token.clone()))
    }
}
