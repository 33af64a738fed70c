//! OAuth 2.0 types and structures
//!
//! The persisted token record, the token endpoint's response and error
//! bodies, and the client configuration.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::client::OAuthClientError;

/// Seconds before expiry at which a token stops being usable without refresh.
pub const VALIDITY_MARGIN_SECS: i64 = 60;

/// Access token plus the metadata needed to refresh and persist it.
///
/// Serialized form is the on-disk cache layout: `expiry` is an RFC 3339
/// timestamp.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,

    /// Token type (always "Bearer" for Spotify)
    pub token_type: String,

    /// Optional because a refresh response may omit it; the prior value is
    /// carried over in that case
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiration timestamp (UTC)
    pub expiry: DateTime<Utc>,

    /// Client the token was issued to; a cached record for another client is
    /// ignored
    pub client_id: String,

    /// Granted scopes (space-separated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenRecord {
    /// Whether the token can be used at `now` without refreshing:
    /// `now + 60s < expiry`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(VALIDITY_MARGIN_SECS) < self.expiry
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Whether the token expires within `threshold_seconds` from now.
    #[must_use]
    pub fn expires_within(&self, threshold_seconds: i64) -> bool {
        self.expiry <= Utc::now() + Duration::seconds(threshold_seconds)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_within(0)
    }

    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Seconds until expiration; negative once expired.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expiry - Utc::now()).num_seconds()
    }
}

// Tokens never show up in logs or panic messages.
impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expiry", &self.expiry)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .finish()
    }
}

/// OAuth token response from the token endpoint (RFC 6749 §5.1).
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    /// Build a record expiring `expires_in` seconds from now. When the
    /// response carries no refresh token, `prior_refresh_token` is kept.
    ///
    /// # Errors
    /// Returns [`OAuthClientError::ParseError`] when `expires_in` does not
    /// yield a representable expiry.
    pub fn into_record(
        self,
        client_id: &str,
        prior_refresh_token: Option<String>,
    ) -> Result<TokenRecord, OAuthClientError> {
        let expiry = Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                OAuthClientError::ParseError(format!("expires_in out of range: {}", self.expires_in))
            })?;

        Ok(TokenRecord {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()).or(prior_refresh_token),
            expiry,
            client_id: client_id.to_string(),
            scope: self.scope,
        })
    }
}

/// OAuth configuration for the authorization server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,

    /// Loopback redirect URI
    pub redirect_uri: String,

    /// OAuth scopes to request
    pub scopes: Vec<String>,

    pub authorize_url: String,
    pub token_url: String,

    /// Force the consent dialog even for previously authorized users
    pub show_dialog: bool,
}

impl OAuthConfig {
    /// Create a configuration against the given endpoints.
    #[must_use]
    pub fn new(
        client_id: String,
        redirect_uri: String,
        scopes: Vec<String>,
        authorize_url: String,
        token_url: String,
    ) -> Self {
        Self { client_id, redirect_uri, scopes, authorize_url, token_url, show_dialog: true }
    }

    /// Get scopes as space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// OAuth error response from the authorization server (RFC 6749 §5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::types.
    use super::*;

    fn record_expiring_in(seconds: i64) -> TokenRecord {
        TokenRecord {
            access_token: "AT".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("RT".to_string()),
            expiry: Utc::now() + Duration::seconds(seconds),
            client_id: "abc".to_string(),
            scope: None,
        }
    }

    #[test]
    fn test_validity_window_boundaries() {
        let now = Utc::now();
        let mut record = record_expiring_in(0);

        record.expiry = now + Duration::seconds(59);
        assert!(!record.is_valid_at(now));

        record.expiry = now + Duration::seconds(60);
        assert!(!record.is_valid_at(now));

        record.expiry = now + Duration::seconds(61);
        assert!(record.is_valid_at(now));
    }

    #[test]
    fn test_expires_within_threshold() {
        let record = record_expiring_in(240);
        assert!(record.expires_within(300));
        assert!(!record.expires_within(60));
        assert!(!record.is_expired());

        assert!(record_expiring_in(-3600).is_expired());
    }

    #[test]
    fn test_response_into_record_sets_expiry() {
        let response = TokenResponse {
            access_token: "AT".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("RT".to_string()),
            expires_in: 3600,
            scope: Some("user-read-playback-state".to_string()),
        };

        let record = response.into_record("abc", None).unwrap();

        assert_eq!(record.access_token, "AT");
        assert_eq!(record.refresh_token.as_deref(), Some("RT"));
        assert_eq!(record.client_id, "abc");
        let secs = record.seconds_until_expiry();
        assert!(secs > 3590 && secs <= 3600, "unexpected expiry: {secs}");
    }

    #[test]
    fn test_response_without_refresh_token_keeps_prior() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"NEW","token_type":"Bearer","expires_in":3600}"#,
        )
        .unwrap();

        let record = response.into_record("abc", Some("RT".to_string())).unwrap();
        assert_eq!(record.access_token, "NEW");
        assert_eq!(record.refresh_token.as_deref(), Some("RT"));
    }

    #[test]
    fn test_unrepresentable_lifetime_is_parse_error() {
        for expires_in in [i64::MAX, i64::MIN] {
            let response = TokenResponse {
                access_token: "AT".to_string(),
                token_type: "Bearer".to_string(),
                refresh_token: None,
                expires_in,
                scope: None,
            };

            match response.into_record("abc", None) {
                Err(OAuthClientError::ParseError(msg)) => assert!(msg.contains("expires_in")),
                other => panic!("expected parse error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_persisted_layout_uses_rfc3339_expiry() {
        let record = record_expiring_in(3600);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["access_token"], "AT");
        assert_eq!(json["client_id"], "abc");
        let expiry = json["expiry"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(expiry).is_ok());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", record_expiring_in(10));
        assert!(!debug.contains("\"AT\""));
        assert!(!debug.contains("\"RT\""));
        assert!(debug.contains("abc"));
    }

    #[test]
    fn test_oauth_error_display() {
        let error = OAuthError {
            error: "invalid_grant".to_string(),
            error_description: Some("Invalid authorization code".to_string()),
        };
        assert_eq!(error.to_string(), "invalid_grant: Invalid authorization code");

        let error = OAuthError { error: "invalid_request".to_string(), error_description: None };
        assert_eq!(error.to_string(), "invalid_request");
    }
}
