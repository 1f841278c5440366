//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. Record IDs are integers
//! drawn from the `_sequence` table so that public IDs stay numeric.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- ID sequences
-- =======================================================================
DEFINE TABLE _sequence SCHEMAFULL;
DEFINE FIELD value ON TABLE _sequence TYPE int DEFAULT 0;

-- =======================================================================
-- Users (read by the session core, owned by the profile subsystem)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE option<string>;
DEFINE FIELD name ON TABLE user TYPE option<string>;
DEFINE FIELD email ON TABLE user TYPE option<string>;
DEFINE FIELD email_verified_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD phone ON TABLE user TYPE option<string>;
DEFINE FIELD phone_verified_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD is_locked ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD lock_expired_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD last_seen_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Sessions (soft-deleted through is_invalid, never removed)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE int;
DEFINE FIELD client_id ON TABLE session TYPE option<string>;
DEFINE FIELD device_id ON TABLE session TYPE option<int>;
DEFINE FIELD is_machine ON TABLE session TYPE bool DEFAULT false;
DEFINE FIELD refresh_token_hash ON TABLE session TYPE string;
DEFINE FIELD last_seen_at ON TABLE session TYPE datetime;
DEFINE FIELD last_seen_ip ON TABLE session TYPE option<string>;
DEFINE FIELD last_seen_location ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD last_password_verified_at ON TABLE session \
    TYPE option<datetime>;
DEFINE FIELD is_invalid ON TABLE session TYPE bool DEFAULT false;
DEFINE FIELD expired_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_refresh_token ON TABLE session \
    COLUMNS refresh_token_hash;
DEFINE INDEX idx_session_user ON TABLE session COLUMNS user_id;

-- =======================================================================
-- Roles
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD is_system_role ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_name ON TABLE role COLUMNS name UNIQUE;

-- =======================================================================
-- Role assignments (user -> role)
-- =======================================================================
DEFINE TABLE role_user TYPE RELATION IN user OUT role SCHEMAFULL;
DEFINE FIELD created_at ON TABLE role_user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_user_unique ON TABLE role_user \
    COLUMNS in, out UNIQUE;
";

/// Apply all migrations newer than the recorded schema version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(window[0].version < window[1].version);
        }
    }

    #[test]
    fn session_table_has_no_plaintext_token_column() {
        assert!(SCHEMA_V1.contains("refresh_token_hash"));
        assert!(!SCHEMA_V1.contains("FIELD refresh_token ON"));
    }
}
