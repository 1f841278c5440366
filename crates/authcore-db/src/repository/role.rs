//! SurrealDB implementation of [`RoleRepository`].
//!
//! Assignments are `role_user` graph edges from `user` to `role`.

use authcore_core::error::{AuthcoreError, AuthcoreResult};
use authcore_core::models::role::{CreateRole, Role};
use authcore_core::repository::{PaginatedResult, Pagination, RoleRepository};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::CountRow;
use crate::error::DbError;
use crate::sequence::next_id;

#[derive(Debug, SurrealValue)]
struct RoleRow {
    name: String,
    is_system_role: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: i64,
    name: String,
    is_system_role: bool,
    created_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, id: i64) -> Role {
        Role {
            id,
            name: self.name,
            is_system_role: self.is_system_role,
            created_at: self.created_at,
        }
    }
}

impl From<RoleRowWithId> for Role {
    fn from(row: RoleRowWithId) -> Self {
        Role {
            id: row.record_id,
            name: row.name,
            is_system_role: row.is_system_role,
            created_at: row.created_at,
        }
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_id(&self, id: i64) -> AuthcoreResult<Role> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('role', $id)")
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("role", id))?;
        Ok(row.into_role(id))
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> AuthcoreResult<Role> {
        match self.get_by_name(&input.name).await {
            Ok(_) => {
                return Err(AuthcoreError::AlreadyExists {
                    entity: format!("role {}", input.name),
                });
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let id = next_id(&self.db, "role").await?;

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 name = $name, is_system_role = $is_system_role",
            )
            .bind(("id", id))
            .bind(("name", input.name))
            .bind(("is_system_role", input.is_system_role))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("role", id))?;
        Ok(row.into_role(id))
    }

    async fn get_by_name(&self, name: &str) -> AuthcoreResult<Role> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM role WHERE name = $name")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("role", name))?;
        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> AuthcoreResult<()> {
        let role = self.get_by_id(id).await?;
        if role.is_system_role {
            return Err(AuthcoreError::permission_denied(format!(
                "system role {} cannot be deleted",
                role.name
            )));
        }

        // Delete assignment edges first, then the role record.
        self.db
            .query(
                "DELETE role_user WHERE out = type::record('role', $id); \
                 DELETE type::record('role', $id);",
            )
            .bind(("id", id))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> AuthcoreResult<PaginatedResult<Role>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM role GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows.into_iter().map(Role::from).collect(),
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn assign_to_user(&self, role_id: i64, user_id: i64) -> AuthcoreResult<()> {
        self.get_by_id(role_id).await?;

        // Re-assigning an existing role is a no-op.
        self.db
            .query(
                "LET $from = type::record('user', $user_id); \
                 LET $to = type::record('role', $role_id); \
                 IF count(SELECT * FROM role_user WHERE in = $from AND out = $to) = 0 { \
                     RELATE $from->role_user->$to; \
                 };",
            )
            .bind(("user_id", user_id))
            .bind(("role_id", role_id))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn unassign_from_user(&self, role_id: i64, user_id: i64) -> AuthcoreResult<()> {
        self.db
            .query(
                "DELETE role_user WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('role', $role_id)",
            )
            .bind(("user_id", user_id))
            .bind(("role_id", role_id))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_user_roles(&self, user_id: i64) -> AuthcoreResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE id IN (\
                     SELECT VALUE out FROM role_user \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("user_id", user_id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn find_user_ids_by_role_name(&self, name: &str) -> AuthcoreResult<Vec<i64>> {
        let mut result = self
            .db
            .query("SELECT VALUE meta::id(in) FROM role_user WHERE out.name = $name")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let ids: Vec<i64> = result.take(0).map_err(DbError::from)?;
        Ok(ids)
    }
}
