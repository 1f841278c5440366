//! Database-specific error types and conversions.

use authcore_core::error::AuthcoreError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for AuthcoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AuthcoreError::NotFound { entity, id },
            other => AuthcoreError::Database(other.to_string()),
        }
    }
}
