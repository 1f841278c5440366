//! Authentication error types.

use authcore_core::error::AuthcoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,

    #[error("unrecognized key id")]
    UnknownKeyId,

    #[error("unrecognized service account: {0}")]
    UnknownServiceAccount(String),

    #[error("unexpected subject in service account token")]
    UnexpectedSubject,

    #[error("malformed claims: {0}")]
    MalformedClaims(String),

    #[error("account is locked")]
    AccountLocked,

    #[error("invalid client id: {0}")]
    UnknownClient(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for AuthcoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::UnsupportedAlgorithm
            | AuthError::UnknownKeyId
            | AuthError::UnknownServiceAccount(_)
            | AuthError::UnexpectedSubject => AuthcoreError::Unauthenticated {
                reason: err.to_string(),
            },
            AuthError::MalformedClaims(_) | AuthError::UnknownClient(_) => {
                AuthcoreError::InvalidArgument {
                    message: err.to_string(),
                }
            }
            AuthError::AccountLocked => AuthcoreError::PermissionDenied {
                reason: "cannot generate access token for a locked user".into(),
            },
            AuthError::InvalidKey(msg) | AuthError::Crypto(msg) => AuthcoreError::Crypto(msg),
            AuthError::InvalidConfig(msg) => AuthcoreError::Internal(msg),
        }
    }
}
