//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Stores are generic over these
//! traits so they can be exercised against any backend.

use chrono::{DateTime, Utc};

use crate::error::AuthcoreResult;
use crate::models::{
    role::{CreateRole, Role},
    session::{CreateSession, Session},
    user::{CreateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = AuthcoreResult<Session>> + Send;

    /// Fetch a session by ID. Invalidated or expired sessions are
    /// reported as not found.
    fn get_live_by_id(&self, id: i64) -> impl Future<Output = AuthcoreResult<Session>> + Send;

    fn get_live_by_refresh_token_hash(
        &self,
        hash: &str,
    ) -> impl Future<Output = AuthcoreResult<Session>> + Send;

    /// Persist mutable fields of a session that is still valid.
    fn update(&self, session: &Session) -> impl Future<Output = AuthcoreResult<Session>> + Send;

    fn invalidate(&self, id: i64) -> impl Future<Output = AuthcoreResult<()>> + Send;

    /// Live sessions, newest first, optionally restricted to one user.
    fn list_live(
        &self,
        user_id: Option<i64>,
        pagination: Pagination,
    ) -> impl Future<Output = AuthcoreResult<PaginatedResult<Session>>> + Send;
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = AuthcoreResult<User>> + Send;
    fn get_by_id(&self, id: i64) -> impl Future<Output = AuthcoreResult<User>> + Send;
    /// Lock the user until `until`, or unlock when `None`.
    fn set_lock(
        &self,
        id: i64,
        until: Option<DateTime<Utc>>,
    ) -> impl Future<Output = AuthcoreResult<User>> + Send;
    fn update_last_seen_at(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> impl Future<Output = AuthcoreResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = AuthcoreResult<Role>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = AuthcoreResult<Role>> + Send;
    /// Delete a role and its assignments. System roles are refused.
    fn delete(&self, id: i64) -> impl Future<Output = AuthcoreResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = AuthcoreResult<PaginatedResult<Role>>> + Send;
    fn assign_to_user(
        &self,
        role_id: i64,
        user_id: i64,
    ) -> impl Future<Output = AuthcoreResult<()>> + Send;
    fn unassign_from_user(
        &self,
        role_id: i64,
        user_id: i64,
    ) -> impl Future<Output = AuthcoreResult<()>> + Send;
    fn get_user_roles(&self, user_id: i64) -> impl Future<Output = AuthcoreResult<Vec<Role>>> + Send;
    /// IDs of users directly assigned the named role.
    fn find_user_ids_by_role_name(
        &self,
        name: &str,
    ) -> impl Future<Output = AuthcoreResult<Vec<i64>>> + Send;
}
