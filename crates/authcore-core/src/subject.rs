//! Subject identities as seen by the authorization layer.
//!
//! Subjects are parsed once at the authentication boundary. Their
//! textual form (`u:<id>`, `serviceaccount:<id>`, `guest`) is what the
//! policy rule table refers to.

use std::fmt;
use std::str::FromStr;

use crate::error::AuthcoreError;

/// Prefix of a human user subject.
pub const USER_PREFIX: &str = "u:";
/// Prefix of a service account subject and of the `iss` claim in
/// self-issued machine tokens.
pub const SERVICE_ACCOUNT_PREFIX: &str = "serviceaccount:";
/// Prefix of a role node in the role graph.
pub const ROLE_PREFIX: &str = "r:";
/// Sentinel subject for unauthenticated requests.
pub const GUEST: &str = "guest";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subject {
    User(i64),
    /// Lower-cased service account ID.
    ServiceAccount(String),
    Guest,
}

impl Subject {
    pub fn service_account(id: &str) -> Self {
        Subject::ServiceAccount(id.to_lowercase())
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Subject::Guest)
    }

    /// Whether `name` carries a prefix of a subject that holds roles
    /// outside the static rule table.
    pub fn has_dynamic_prefix(name: &str) -> bool {
        name.starts_with(USER_PREFIX) || name.starts_with(SERVICE_ACCOUNT_PREFIX)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User(id) => write!(f, "{USER_PREFIX}{id}"),
            Subject::ServiceAccount(id) => write!(f, "{SERVICE_ACCOUNT_PREFIX}{id}"),
            Subject::Guest => f.write_str(GUEST),
        }
    }
}

impl FromStr for Subject {
    type Err = AuthcoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix(USER_PREFIX) {
            let id = id
                .parse::<i64>()
                .map_err(|_| AuthcoreError::invalid_argument(format!("invalid user subject: {s}")))?;
            return Ok(Subject::User(id));
        }
        if let Some(id) = s.strip_prefix(SERVICE_ACCOUNT_PREFIX) {
            if id.is_empty() {
                return Err(AuthcoreError::invalid_argument(
                    "empty service account subject",
                ));
            }
            return Ok(Subject::service_account(id));
        }
        if s == GUEST {
            return Ok(Subject::Guest);
        }
        Err(AuthcoreError::invalid_argument(format!(
            "unrecognized subject: {s}"
        )))
    }
}

/// Render a role name as a role-graph node (`r:<name>`).
pub fn role_node(name: &str) -> String {
    format!("{ROLE_PREFIX}{name}")
}

/// Extract the role name from a role-graph node.
pub fn role_name(node: &str) -> Result<&str, AuthcoreError> {
    node.strip_prefix(ROLE_PREFIX)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AuthcoreError::invalid_argument(format!("not a role node: {node}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_from_str() {
        for subject in [
            Subject::User(42),
            Subject::service_account("Builder"),
            Subject::Guest,
        ] {
            let parsed: Subject = subject.to_string().parse().unwrap();
            assert_eq!(parsed, subject);
        }
    }

    #[test]
    fn service_account_ids_are_lower_cased() {
        let subject: Subject = "serviceaccount:CI-Runner".parse().unwrap();
        assert_eq!(subject, Subject::ServiceAccount("ci-runner".into()));
        assert_eq!(subject.to_string(), "serviceaccount:ci-runner");
    }

    #[test]
    fn malformed_user_subject_is_invalid_argument() {
        let err = "u:abc".parse::<Subject>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn role_nodes() {
        assert_eq!(role_node("authcore.admin"), "r:authcore.admin");
        assert_eq!(role_name("r:authcore.admin").unwrap(), "authcore.admin");
        assert!(role_name("u:1").is_err());
        assert!(role_name("r:").is_err());
    }

    #[test]
    fn dynamic_prefixes() {
        assert!(Subject::has_dynamic_prefix("u:1"));
        assert!(Subject::has_dynamic_prefix("serviceaccount:x"));
        assert!(!Subject::has_dynamic_prefix("r:authcore.admin"));
        assert!(!Subject::has_dynamic_prefix("guest"));
    }
}
