//! User domain model.
//!
//! Users are owned by the user-profile subsystem; this core only reads
//! their identity, contact claims and lock state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub phone: Option<String>,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub is_locked: bool,
    pub lock_expired_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn public_id(&self) -> String {
        self.id.to_string()
    }

    /// Name shown to other parties: the explicit name, else the first
    /// available contact, else the public ID.
    pub fn display_name(&self) -> String {
        self.name
            .as_ref()
            .or(self.email.as_ref())
            .or(self.phone.as_ref())
            .cloned()
            .unwrap_or_else(|| self.public_id())
    }

    pub fn is_currently_locked(&self) -> bool {
        self.is_currently_locked_at(Utc::now())
    }

    /// A lock only applies until its expiry.
    pub fn is_currently_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.is_locked && self.lock_expired_at.is_some_and(|until| until > now)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 9,
            username: None,
            name: None,
            email: None,
            email_verified_at: None,
            phone: None,
            phone_verified_at: None,
            is_locked: false,
            lock_expired_at: None,
            last_seen_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn display_name_falls_back() {
        let mut u = user();
        assert_eq!(u.display_name(), "9");
        u.phone = Some("+85212345678".into());
        assert_eq!(u.display_name(), "+85212345678");
        u.email = Some("bob@example.com".into());
        assert_eq!(u.display_name(), "bob@example.com");
        u.name = Some("Bob".into());
        assert_eq!(u.display_name(), "Bob");
    }

    #[test]
    fn lock_expires() {
        let now = Utc::now();
        let mut u = user();
        u.is_locked = true;
        u.lock_expired_at = Some(now + Duration::hours(1));
        assert!(u.is_currently_locked_at(now));
        assert!(!u.is_currently_locked_at(now + Duration::hours(2)));
    }
}
