//! Integration tests for the Role and User repositories.

use authcore_core::error::ErrorKind;
use authcore_core::models::role::CreateRole;
use authcore_core::models::user::CreateUser;
use authcore_core::repository::{Pagination, RoleRepository, UserRepository};
use authcore_db::repository::{SurrealRoleRepository, SurrealUserRepository};
use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    authcore_db::run_migrations(&db).await.unwrap();
    db
}

fn role(name: &str, is_system_role: bool) -> CreateRole {
    CreateRole {
        name: name.into(),
        is_system_role,
    }
}

#[tokio::test]
async fn assign_and_resolve_roles_both_ways() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let users = SurrealUserRepository::new(db);

    let alice = users.create(CreateUser::default()).await.unwrap();
    let bob = users.create(CreateUser::default()).await.unwrap();
    let admin = roles.create(role("authcore.admin", true)).await.unwrap();
    let editor = roles.create(role("authcore.editor", true)).await.unwrap();

    roles.assign_to_user(admin.id, alice.id).await.unwrap();
    roles.assign_to_user(editor.id, alice.id).await.unwrap();
    roles.assign_to_user(editor.id, bob.id).await.unwrap();
    // Repeated assignment is a no-op.
    roles.assign_to_user(editor.id, bob.id).await.unwrap();

    let names: Vec<String> = roles
        .get_user_roles(alice.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["authcore.admin", "authcore.editor"]);

    let mut holders = roles
        .find_user_ids_by_role_name("authcore.editor")
        .await
        .unwrap();
    holders.sort();
    assert_eq!(holders, vec![alice.id, bob.id]);

    roles.unassign_from_user(editor.id, bob.id).await.unwrap();
    assert!(roles.get_user_roles(bob.id).await.unwrap().is_empty());
    assert!(
        roles
            .find_user_ids_by_role_name("no.such.role")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn system_roles_cannot_be_deleted() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db);

    let admin = roles.create(role("authcore.admin", true)).await.unwrap();
    let err = roles.delete(admin.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(roles.get_by_name("authcore.admin").await.is_ok());
}

#[tokio::test]
async fn deleting_a_role_removes_its_assignments() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let users = SurrealUserRepository::new(db);

    let user = users.create(CreateUser::default()).await.unwrap();
    let support = roles.create(role("support", false)).await.unwrap();
    roles.assign_to_user(support.id, user.id).await.unwrap();

    roles.delete(support.id).await.unwrap();
    assert!(roles.get_by_name("support").await.unwrap_err().is_not_found());
    assert!(roles.get_user_roles(user.id).await.unwrap().is_empty());
    assert!(roles.delete(support.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn duplicate_role_names_are_rejected() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db);

    roles.create(role("support", false)).await.unwrap();
    let err = roles.create(role("support", false)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let page = roles.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn user_lock_and_last_seen() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db);

    let user = users
        .create(CreateUser {
            email: Some("carol@example.com".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!user.is_currently_locked());
    assert_eq!(user.display_name(), "carol@example.com");

    let locked = users
        .set_lock(user.id, Some(Utc::now() + Duration::hours(1)))
        .await
        .unwrap();
    assert!(locked.is_currently_locked());

    let unlocked = users.set_lock(user.id, None).await.unwrap();
    assert!(!unlocked.is_currently_locked());

    let seen = Utc::now();
    users.update_last_seen_at(user.id, seen).await.unwrap();
    assert!(users.get_by_id(user.id).await.unwrap().last_seen_at.is_some());

    assert!(users.get_by_id(9999).await.unwrap_err().is_not_found());
}
