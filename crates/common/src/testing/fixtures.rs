//! Test fixture generators
//!
//! Token records with controlled expiry for session and cache tests.

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::auth::TokenRecord;

/// Generate a random alphanumeric string of specified length
///
/// # Examples
///
/// ```
/// use nadctl_common::testing::fixtures::random_string;
///
/// let s = random_string(10);
/// assert_eq!(s.len(), 10);
/// ```
pub fn random_string(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Token record for `client_id` expiring `expires_in_secs` from now
/// (negative for an already expired token).
///
/// # Examples
///
/// ```
/// use nadctl_common::testing::fixtures::token_record;
///
/// let record = token_record("abc", 3600, Some("RT"));
/// assert!(record.is_valid());
/// assert_eq!(record.refresh_token.as_deref(), Some("RT"));
/// ```
pub fn token_record(client_id: &str, expires_in_secs: i64, refresh_token: Option<&str>) -> TokenRecord {
    TokenRecord {
        access_token: format!("access-{}", random_string(16)),
        token_type: "Bearer".to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expiry: Utc::now() + Duration::seconds(expires_in_secs),
        client_id: client_id.to_string(),
        scope: Some(
            "user-read-currently-playing user-read-playback-state user-modify-playback-state"
                .to_string(),
        ),
    }
}

/// Valid for an hour, with a refresh token.
pub fn valid_token(client_id: &str) -> TokenRecord {
    token_record(client_id, 3600, Some("refresh-token"))
}
