//! SurrealDB repository implementations.

mod role;
mod session;
mod user;

pub use role::SurrealRoleRepository;
pub use session::SurrealSessionRepository;
pub use user::SurrealUserRepository;

use surrealdb_types::SurrealValue;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}
