//! Domain models for Authcore.
//!
//! These are the core types shared across all crates.

pub mod role;
pub mod session;
pub mod user;

/// Parse a textual public ID (as used in URLs and token claims) into
/// the internal numeric ID.
pub fn parse_public_id(entity: &str, public_id: &str) -> crate::AuthcoreResult<i64> {
    public_id
        .parse::<i64>()
        .map_err(|_| crate::AuthcoreError::InvalidArgument {
            message: format!("invalid {entity} id: {public_id}"),
        })
}
