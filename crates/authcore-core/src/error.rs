//! Error types for the Authcore system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthcoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Policy engine error: {0}")]
    Policy(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AuthcoreResult<T> = Result<T, AuthcoreError>;

/// The externally visible classification of an [`AuthcoreError`].
///
/// Transport layers map on this rather than on individual variants so
/// that storage, crypto and policy-engine failures all surface the same
/// way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    PermissionDenied,
    InvalidArgument,
    NotFound,
    Unknown,
}

impl AuthcoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthcoreError::NotFound { .. } => ErrorKind::NotFound,
            AuthcoreError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            AuthcoreError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            AuthcoreError::InvalidArgument { .. } | AuthcoreError::AlreadyExists { .. } => {
                ErrorKind::InvalidArgument
            }
            AuthcoreError::Database(_)
            | AuthcoreError::Crypto(_)
            | AuthcoreError::Policy(_)
            | AuthcoreError::DeadlineExceeded
            | AuthcoreError::Internal(_) => ErrorKind::Unknown,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        AuthcoreError::Unauthenticated {
            reason: reason.into(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        AuthcoreError::PermissionDenied {
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AuthcoreError::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_and_policy_failures_are_unknown() {
        assert_eq!(AuthcoreError::Database("x".into()).kind(), ErrorKind::Unknown);
        assert_eq!(AuthcoreError::Policy("x".into()).kind(), ErrorKind::Unknown);
        assert_eq!(AuthcoreError::DeadlineExceeded.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn not_found_is_detected() {
        let err = AuthcoreError::NotFound {
            entity: "session".into(),
            id: "1".into(),
        };
        assert!(err.is_not_found());
        assert!(!AuthcoreError::unauthenticated("expired").is_not_found());
    }
}
