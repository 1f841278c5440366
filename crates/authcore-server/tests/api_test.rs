//! End-to-end router tests against in-memory SurrealDB.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use authcore_auth::config::{ApplicationConfig, ServiceAccountConfig};
use authcore_auth::keys::SigningKey;
use authcore_auth::token::mint_service_account_token;
use authcore_auth::{AuthConfig, AuthContext, CreateSessionInput};
use authcore_core::RequestContext;
use authcore_core::models::role::CreateRole;
use authcore_core::models::session::Session;
use authcore_core::models::user::CreateUser;
use authcore_core::repository::{RoleRepository, UserRepository};
use authcore_db::repository::{SurrealRoleRepository, SurrealUserRepository};
use authcore_db::{DbConfig, DbManager};
use authcore_rbac::PolicySource;
use authcore_server::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const SYSTEM_PRIVATE: &str = include_str!("fixtures/system_private.pem");
const SA_PRIVATE: &str = include_str!("fixtures/service_account_private.pem");
const SA_PUBLIC: &str = include_str!("fixtures/service_account_public.pem");
const SYSTEM_KID: &str = "kKCFQK0iB9-Lb67ilUz4U4KeD5-aL8KiZeJJ9K6blIc";

struct TestApp {
    app: Router,
    state: AppState,
    users: SurrealUserRepository<surrealdb::engine::any::Any>,
    alice: i64,
    bob: i64,
    admin: i64,
}

fn auth_config() -> AuthConfig {
    let mut applications = HashMap::new();
    applications.insert(
        "console".to_string(),
        ApplicationConfig {
            name: "Console".into(),
            ..Default::default()
        },
    );
    let mut service_accounts = HashMap::new();
    service_accounts.insert(
        "123456".to_string(),
        ServiceAccountConfig {
            public_key: SA_PUBLIC.into(),
            roles: vec!["authcore.editor".into()],
        },
    );
    AuthConfig {
        access_token_private_key: SYSTEM_PRIVATE.into(),
        default_client_id: "console".into(),
        applications,
        service_accounts,
        ..Default::default()
    }
}

async fn setup() -> TestApp {
    let db = DbManager::connect(&DbConfig {
        url: "mem://".into(),
        username: None,
        password: None,
        ..Default::default()
    })
    .await
    .unwrap();
    let client = db.client().clone();

    let users = SurrealUserRepository::new(client.clone());
    let mut ids = Vec::new();
    for name in ["alice", "bob", "admin"] {
        let user = users
            .create(CreateUser {
                username: Some(name.into()),
                name: Some(name.into()),
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(user.id);
    }
    let roles = SurrealRoleRepository::new(client.clone());
    let admin_role = roles
        .create(CreateRole {
            name: "authcore.admin".into(),
            is_system_role: true,
        })
        .await
        .unwrap();
    roles.assign_to_user(admin_role.id, ids[2]).await.unwrap();

    let context = Arc::new(AuthContext::from_config(&auth_config()).unwrap());
    let state = AppState::new(
        client,
        context,
        &PolicySource::builtin().unwrap(),
        Duration::from_secs(5),
    )
    .await
    .unwrap();
    TestApp {
        app: authcore_server::router(state.clone()),
        state,
        users,
        alice: ids[0],
        bob: ids[1],
        admin: ids[2],
    }
}

impl TestApp {
    async fn login(&self, user_id: i64) -> (Session, String) {
        let ctx = RequestContext::new();
        let session = self
            .state
            .sessions
            .create_session(
                &ctx,
                CreateSessionInput {
                    user_id,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let token = self
            .state
            .sessions
            .generate_access_token(&ctx, &session, false)
            .await
            .unwrap();
        (session, token.access_token)
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[tokio::test]
async fn public_endpoints_are_open_to_guests() {
    let t = setup().await;

    let (status, _) = t.call(Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.call(Method::GET, "/.well-known/jwks.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keys"][0]["kid"], SYSTEM_KID);
    assert_eq!(body["keys"][0]["alg"], "ES256");
    assert_eq!(body["keys"][0]["use"], "sig");
}

#[tokio::test]
async fn guest_denied_is_unauthenticated_and_user_denied_is_forbidden() {
    let t = setup().await;
    let (session, token) = t.login(t.alice).await;
    let uri = format!("/api/v2/sessions/{}", session.id);

    let (status, body) = t.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, body) = t.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");
}

#[tokio::test]
async fn invalid_bearer_token_is_unauthenticated() {
    let t = setup().await;
    let (status, _) = t
        .call(Method::GET, "/healthz", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_session_lifecycle() {
    let t = setup().await;
    let (session, token) = t.login(t.alice).await;

    let (status, body) = t
        .call(Method::GET, "/api/v2/sessions/current", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], session.id);
    assert_eq!(body["user_id"], t.alice);
    assert_eq!(body["client_id"], "console");

    let (status, _) = t
        .call(Method::DELETE, "/api/v2/sessions/current", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The token is still signed and unexpired, but its session is gone.
    let (status, _) = t
        .call(Method::GET, "/api/v2/sessions/current", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_user_sessions() {
    let t = setup().await;
    let (first, token) = t.login(t.alice).await;
    let (second, _) = t.login(t.alice).await;
    let (bobs, _) = t.login(t.bob).await;

    let (status, body) = t
        .call(Method::GET, "/api/v2/users/current/sessions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_size"], 2);
    let ids: Vec<i64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert!(ids.contains(&first.id) && ids.contains(&second.id));

    let uri = format!("/api/v2/users/current/sessions/{}", bobs.id);
    let (status, _) = t.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/v2/users/current/sessions/{}", second.id);
    let (status, _) = t.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_manages_any_session() {
    let t = setup().await;
    let (_, admin_token) = t.login(t.admin).await;
    let (bobs, _) = t.login(t.bob).await;

    let uri = format!("/api/v2/users/{}/sessions?limit=10", t.bob);
    let (status, body) = t.call(Method::GET, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_size"], 1);
    assert_eq!(body["limit"], 10);

    let uri = format!("/api/v2/sessions/{}", bobs.id);
    let (status, body) = t.call(Method::GET, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], bobs.id);

    let (status, _) = t.call(Method::DELETE, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.call(Method::GET, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .call(Method::GET, "/api/v2/sessions/abc", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn service_account_reads_sessions_through_its_role() {
    let t = setup().await;
    let (bobs, _) = t.login(t.bob).await;
    let key = SigningKey::from_pem(SA_PRIVATE).unwrap();
    let token = mint_service_account_token(&key, "123456", chrono::Duration::minutes(5)).unwrap();

    let uri = format!("/api/v2/sessions/{}", bobs.id);
    let (status, _) = t.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn refresh_grant_issues_access_and_id_tokens() {
    let t = setup().await;
    let (session, _) = t.login(t.alice).await;
    let refresh_token = session.refresh_token.clone().unwrap();

    let (status, body) = t
        .call(
            Method::POST,
            "/api/v2/tokens",
            None,
            Some(json!({ "grant_type": "refresh_token", "token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["id_token"].is_string());
    assert!(body.get("refresh_token").is_none());

    let access_token = body["access_token"].as_str().unwrap();
    let (status, body) = t
        .call(Method::GET, "/api/v2/sessions/current", Some(access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], session.id);
}

#[tokio::test]
async fn refresh_grant_rejections() {
    let t = setup().await;
    let (session, _) = t.login(t.alice).await;
    let refresh_token = session.refresh_token.clone().unwrap();

    let (status, _) = t
        .call(
            Method::POST,
            "/api/v2/tokens",
            None,
            Some(json!({ "grant_type": "refresh_token", "token": "unknown" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .call(
            Method::POST,
            "/api/v2/tokens",
            None,
            Some(json!({ "grant_type": "password", "token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    t.users
        .set_lock(t.alice, Some(chrono::Utc::now() + chrono::Duration::hours(1)))
        .await
        .unwrap();
    let (status, _) = t
        .call(
            Method::POST,
            "/api/v2/tokens",
            None,
            Some(json!({ "grant_type": "refresh_token", "token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let t = setup().await;
    let (status, _) = t.call(Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
