//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 for authorization without a client secret. Random
//! material comes straight from the operating system RNG; a failure there is
//! reported as [`PkceError`] and callers abort the authorization attempt.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes behind a verifier or state nonce.
const RANDOM_BYTES: usize = 32;

/// The system RNG could not produce random bytes.
#[derive(Debug, thiserror::Error)]
#[error("system random number generator failed: {0}")]
pub struct PkceError(#[from] rand::Error);

fn random_token() -> Result<String, PkceError> {
    let mut bytes = [0u8; RANDOM_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generate a cryptographically secure code verifier
///
/// Returns a URL-safe base64-encoded random string of 32 bytes (43 characters),
/// inside the 43-128 character range RFC 7636 requires.
///
/// # Errors
/// Returns error if the system RNG fails
pub fn generate_code_verifier() -> Result<String, PkceError> {
    random_token()
}

/// Compute `BASE64URL(SHA256(ASCII(code_verifier)))` without padding.
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random state nonce for CSRF protection
///
/// # Errors
/// Returns error if the system RNG fails
pub fn generate_state() -> Result<String, PkceError> {
    random_token()
}

/// Compare the state sent in the authorization request with the one received
/// on the callback. Verbatim comparison.
#[must_use]
pub fn validate_state(expected: &str, actual: &str) -> bool {
    expected == actual
}

/// PKCE verifier/challenge pair for one authorization attempt.
#[derive(Clone)]
pub struct PkceChallenge {
    /// Kept secret until token exchange
    pub code_verifier: String,

    /// Sent in the authorization request
    pub code_challenge: String,
}

impl PkceChallenge {
    /// Generate a new verifier and derive its challenge.
    ///
    /// # Examples
    /// ```
    /// use nadctl_common::auth::pkce::PkceChallenge;
    ///
    /// let pkce = PkceChallenge::generate().unwrap();
    /// assert_eq!(pkce.code_verifier.len(), 43);
    /// ```
    ///
    /// # Errors
    /// Returns error if the system RNG fails
    pub fn generate() -> Result<Self, PkceError> {
        let code_verifier = generate_code_verifier()?;
        let code_challenge = generate_code_challenge(&code_verifier);

        Ok(Self { code_verifier, code_challenge })
    }

    /// Get the challenge method (always "S256" for SHA256)
    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        "S256"
    }
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}
