//! SurrealDB implementation of [`SessionRepository`].
//!
//! Every read goes through the live-session predicate; invalidated rows
//! stay in the table for auditing but are invisible to lookups.

use authcore_core::error::AuthcoreResult;
use authcore_core::models::session::{CreateSession, Session};
use authcore_core::repository::{PaginatedResult, Pagination, SessionRepository};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::CountRow;
use crate::error::DbError;
use crate::sequence::next_id;

const LIVE: &str = "is_invalid = false AND expired_at > time::now()";

/// DB-side row struct for queries where the ID is already known.
#[derive(Debug, SurrealValue)]
struct SessionRow {
    user_id: i64,
    client_id: Option<String>,
    device_id: Option<i64>,
    is_machine: bool,
    refresh_token_hash: String,
    last_seen_at: DateTime<Utc>,
    last_seen_ip: Option<String>,
    last_seen_location: Option<String>,
    user_agent: Option<String>,
    last_password_verified_at: Option<DateTime<Utc>>,
    is_invalid: bool,
    expired_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: i64,
    user_id: i64,
    client_id: Option<String>,
    device_id: Option<i64>,
    is_machine: bool,
    refresh_token_hash: String,
    last_seen_at: DateTime<Utc>,
    last_seen_ip: Option<String>,
    last_seen_location: Option<String>,
    user_agent: Option<String>,
    last_password_verified_at: Option<DateTime<Utc>>,
    is_invalid: bool,
    expired_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRowWithId> for Session {
    fn from(row: SessionRowWithId) -> Self {
        Session {
            id: row.record_id,
            user_id: row.user_id,
            client_id: row.client_id,
            device_id: row.device_id,
            is_machine: row.is_machine,
            refresh_token_hash: row.refresh_token_hash,
            refresh_token: None,
            last_seen_at: row.last_seen_at,
            last_seen_ip: row.last_seen_ip,
            last_seen_location: row.last_seen_location,
            user_agent: row.user_agent,
            last_password_verified_at: row.last_password_verified_at,
            is_invalid: row.is_invalid,
            expired_at: row.expired_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl SessionRow {
    fn into_session(self, id: i64) -> Session {
        Session {
            id,
            user_id: self.user_id,
            client_id: self.client_id,
            device_id: self.device_id,
            is_machine: self.is_machine,
            refresh_token_hash: self.refresh_token_hash,
            refresh_token: None,
            last_seen_at: self.last_seen_at,
            last_seen_ip: self.last_seen_ip,
            last_seen_location: self.last_seen_location,
            user_agent: self.user_agent,
            last_password_verified_at: self.last_password_verified_at,
            is_invalid: self.is_invalid,
            expired_at: self.expired_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn session_by_id(rows: Vec<SessionRow>, id: i64) -> Result<Session, DbError> {
    rows.into_iter()
        .next()
        .map(|row| row.into_session(id))
        .ok_or_else(|| DbError::not_found("session", id))
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> AuthcoreResult<Session> {
        let id = next_id(&self.db, "session").await?;

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 user_id = $user_id, \
                 client_id = $client_id, \
                 device_id = $device_id, \
                 is_machine = $is_machine, \
                 refresh_token_hash = $refresh_token_hash, \
                 last_seen_at = $last_seen_at, \
                 last_seen_ip = $last_seen_ip, \
                 last_seen_location = $last_seen_location, \
                 user_agent = $user_agent, \
                 last_password_verified_at = $last_password_verified_at, \
                 expired_at = $expired_at",
            )
            .bind(("id", id))
            .bind(("user_id", input.user_id))
            .bind(("client_id", input.client_id))
            .bind(("device_id", input.device_id))
            .bind(("is_machine", input.is_machine))
            .bind(("refresh_token_hash", input.refresh_token_hash))
            .bind(("last_seen_at", input.last_seen_at))
            .bind(("last_seen_ip", input.last_seen_ip))
            .bind(("last_seen_location", input.last_seen_location))
            .bind(("user_agent", input.user_agent))
            .bind(("last_password_verified_at", input.last_password_verified_at))
            .bind(("expired_at", input.expired_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(session_by_id(rows, id)?)
    }

    async fn get_live_by_id(&self, id: i64) -> AuthcoreResult<Session> {
        let mut result = self
            .db
            .query(format!(
                "SELECT * FROM type::record('session', $id) WHERE {LIVE}"
            ))
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(session_by_id(rows, id)?)
    }

    async fn get_live_by_refresh_token_hash(&self, hash: &str) -> AuthcoreResult<Session> {
        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE refresh_token_hash = $hash AND {LIVE} LIMIT 1"
            ))
            .bind(("hash", hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        // The hash identifies a bearer credential; keep it out of errors.
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("session", "refresh_token"))?;
        Ok(row.into())
    }

    async fn update(&self, session: &Session) -> AuthcoreResult<Session> {
        let result = self
            .db
            .query(format!(
                "UPDATE type::record('session', $id) SET \
                 refresh_token_hash = $refresh_token_hash, \
                 last_seen_at = $last_seen_at, \
                 last_seen_ip = $last_seen_ip, \
                 last_seen_location = $last_seen_location, \
                 user_agent = $user_agent, \
                 last_password_verified_at = $last_password_verified_at, \
                 expired_at = $expired_at, \
                 updated_at = time::now() \
                 WHERE {LIVE}"
            ))
            .bind(("id", session.id))
            .bind(("refresh_token_hash", session.refresh_token_hash.clone()))
            .bind(("last_seen_at", session.last_seen_at))
            .bind(("last_seen_ip", session.last_seen_ip.clone()))
            .bind(("last_seen_location", session.last_seen_location.clone()))
            .bind(("user_agent", session.user_agent.clone()))
            .bind(("last_password_verified_at", session.last_password_verified_at))
            .bind(("expired_at", session.expired_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(session_by_id(rows, session.id)?)
    }

    async fn invalidate(&self, id: i64) -> AuthcoreResult<()> {
        self.db
            .query(
                "UPDATE type::record('session', $id) SET \
                 is_invalid = true, updated_at = time::now() \
                 WHERE is_invalid = false",
            )
            .bind(("id", id))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_live(
        &self,
        user_id: Option<i64>,
        pagination: Pagination,
    ) -> AuthcoreResult<PaginatedResult<Session>> {
        let filter = match user_id {
            Some(_) => format!("user_id = $user_id AND {LIVE}"),
            None => LIVE.to_string(),
        };

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM session WHERE {filter} GROUP ALL"
            ))
            .bind(("user_id", user_id))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE {filter} \
                 ORDER BY last_seen_at DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("user_id", user_id))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows.into_iter().map(Session::from).collect(),
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
