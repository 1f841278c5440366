//! SurrealDB implementation of [`UserRepository`].

use authcore_core::error::AuthcoreResult;
use authcore_core::models::user::{CreateUser, User};
use authcore_core::repository::UserRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;
use crate::sequence::next_id;

#[derive(Debug, SurrealValue)]
struct UserRow {
    username: Option<String>,
    name: Option<String>,
    email: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
    phone: Option<String>,
    phone_verified_at: Option<DateTime<Utc>>,
    is_locked: bool,
    lock_expired_at: Option<DateTime<Utc>>,
    last_seen_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: i64) -> User {
        User {
            id,
            username: self.username,
            name: self.name,
            email: self.email,
            email_verified_at: self.email_verified_at,
            phone: self.phone,
            phone_verified_at: self.phone_verified_at,
            is_locked: self.is_locked,
            lock_expired_at: self.lock_expired_at,
            last_seen_at: self.last_seen_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn user_by_id(rows: Vec<UserRow>, id: i64) -> Result<User, DbError> {
    rows.into_iter()
        .next()
        .map(|row| row.into_user(id))
        .ok_or_else(|| DbError::not_found("user", id))
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> AuthcoreResult<User> {
        let id = next_id(&self.db, "user").await?;

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 username = $username, name = $name, \
                 email = $email, phone = $phone",
            )
            .bind(("id", id))
            .bind(("username", input.username))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(user_by_id(rows, id)?)
    }

    async fn get_by_id(&self, id: i64) -> AuthcoreResult<User> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(user_by_id(rows, id)?)
    }

    async fn set_lock(&self, id: i64, until: Option<DateTime<Utc>>) -> AuthcoreResult<User> {
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 is_locked = $is_locked, \
                 lock_expired_at = $until, \
                 updated_at = time::now()",
            )
            .bind(("id", id))
            .bind(("is_locked", until.is_some()))
            .bind(("until", until))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(user_by_id(rows, id)?)
    }

    async fn update_last_seen_at(&self, id: i64, at: DateTime<Utc>) -> AuthcoreResult<()> {
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 last_seen_at = $at, updated_at = time::now()",
            )
            .bind(("id", id))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        user_by_id(rows, id)?;
        Ok(())
    }
}
