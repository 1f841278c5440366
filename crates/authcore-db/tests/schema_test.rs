//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    authcore_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info_str = format!("{:?}", info.expect("INFO FOR DB should return a value"));

    for table in ["_sequence", "user", "session", "role", "role_user"] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    authcore_db::run_migrations(&db).await.unwrap();
    authcore_db::run_migrations(&db).await.unwrap();
}

#[tokio::test]
async fn sequences_are_independent_and_monotonic() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    authcore_db::run_migrations(&db).await.unwrap();

    assert_eq!(authcore_db::next_id(&db, "session").await.unwrap(), 1);
    assert_eq!(authcore_db::next_id(&db, "session").await.unwrap(), 2);
    assert_eq!(authcore_db::next_id(&db, "role").await.unwrap(), 1);
}
