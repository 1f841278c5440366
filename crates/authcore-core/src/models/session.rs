//! Session domain model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long, in seconds, a password verification allows sensitive
/// account changes.
pub const PASSWORD_STEP_UP_WINDOW_SECS: i64 = 300;

/// An authenticated (or machine) session.
///
/// A session is live iff `!is_invalid && expired_at > now`. Invalidated
/// sessions are kept for audit purposes and never become live again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub client_id: Option<String>,
    pub device_id: Option<i64>,
    pub is_machine: bool,
    /// Hash of the current refresh token.
    pub refresh_token_hash: String,
    /// Plaintext refresh token. Only populated on the value returned by
    /// session creation; never persisted or serialized.
    #[serde(skip)]
    pub refresh_token: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub last_seen_ip: Option<String>,
    pub last_seen_location: Option<String>,
    pub user_agent: Option<String>,
    pub last_password_verified_at: Option<DateTime<Utc>>,
    pub is_invalid: bool,
    pub expired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired_at <= now
    }

    pub fn is_live(&self) -> bool {
        !self.is_invalid && !self.is_expired()
    }

    /// Textual ID used in token `sid` claims and URLs.
    pub fn public_id(&self) -> String {
        self.id.to_string()
    }

    pub fn public_user_id(&self) -> String {
        self.user_id.to_string()
    }

    /// Whether the password was re-verified recently enough to allow
    /// changing it.
    pub fn update_current_user_password_allowed(&self) -> bool {
        self.update_current_user_password_allowed_at(Utc::now())
    }

    pub fn update_current_user_password_allowed_at(&self, now: DateTime<Utc>) -> bool {
        self.last_password_verified_at
            .is_some_and(|at| now - at < Duration::seconds(PASSWORD_STEP_UP_WINDOW_SECS))
    }
}

/// Input for persisting a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    pub user_id: i64,
    pub client_id: Option<String>,
    pub device_id: Option<i64>,
    pub is_machine: bool,
    pub refresh_token_hash: String,
    pub last_seen_at: DateTime<Utc>,
    pub last_seen_ip: Option<String>,
    pub last_seen_location: Option<String>,
    pub user_agent: Option<String>,
    pub last_password_verified_at: Option<DateTime<Utc>>,
    pub expired_at: DateTime<Utc>,
}
