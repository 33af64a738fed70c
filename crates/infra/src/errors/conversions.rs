//! Conversions from lower-layer errors into domain errors.

use nadctl_common::auth::{OAuthClientError, PkceError, TokenCacheError};
use nadctl_domain::{NadError, TokenExchangeFailure};

use crate::spotify::SpotifyApiError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub NadError);

impl From<InfraError> for NadError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<NadError> for InfraError {
    fn from(value: NadError) -> Self {
        InfraError(value)
    }
}

/// Explicit conversion for errors that carry no operation context.
pub trait IntoNadError {
    fn into_nad(self) -> NadError;
}

/* -------------------------------------------------------------------------- */
/* OAuthClientError → NadError */
/* -------------------------------------------------------------------------- */

impl IntoNadError for OAuthClientError {
    fn into_nad(self) -> NadError {
        match self {
            OAuthClientError::RequestFailed(err) => {
                NadError::TokenExchangeFailed(TokenExchangeFailure::Network {
                    message: err.to_string(),
                })
            }
            OAuthClientError::Status { status, error } => {
                NadError::TokenExchangeFailed(TokenExchangeFailure::Status {
                    status_code: status,
                    detail: error.map(|e| e.to_string()),
                })
            }
            OAuthClientError::ParseError(message) => {
                NadError::TokenExchangeFailed(TokenExchangeFailure::InvalidResponse { message })
            }
            OAuthClientError::NoRefreshToken => NadError::NoRefreshToken,
            OAuthClientError::ConfigError(message) => NadError::Config(message),
        }
    }
}

impl From<OAuthClientError> for InfraError {
    fn from(value: OAuthClientError) -> Self {
        InfraError(value.into_nad())
    }
}

/* -------------------------------------------------------------------------- */
/* TokenCacheError → NadError */
/* -------------------------------------------------------------------------- */

impl IntoNadError for TokenCacheError {
    fn into_nad(self) -> NadError {
        NadError::Cache(self.to_string())
    }
}

impl From<TokenCacheError> for InfraError {
    fn from(value: TokenCacheError) -> Self {
        InfraError(value.into_nad())
    }
}

/* -------------------------------------------------------------------------- */
/* PkceError → NadError */
/* -------------------------------------------------------------------------- */

impl IntoNadError for PkceError {
    fn into_nad(self) -> NadError {
        NadError::Internal(self.to_string())
    }
}

impl From<PkceError> for InfraError {
    fn from(value: PkceError) -> Self {
        InfraError(value.into_nad())
    }
}

/* -------------------------------------------------------------------------- */
/* SpotifyApiError → NadError */
/* -------------------------------------------------------------------------- */

/// Wrap a Web API failure with the operation that issued it.
pub fn upstream_error(operation: &str, err: SpotifyApiError) -> NadError {
    match err {
        SpotifyApiError::Config(message) => NadError::Internal(message),
        other => NadError::upstream(operation, other),
    }
}
