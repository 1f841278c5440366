//! Session management endpoints.

use authcore_core::models::parse_public_id;
use authcore_core::models::session::Session;
use authcore_core::repository::{PaginatedResult, Pagination};
use authcore_core::{AuthcoreError, RequestContext};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::{CurrentSession, CurrentUser};
use crate::state::AppState;

const MAX_PAGE_SIZE: u64 = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v2/users/{id}/sessions", get(list_user_sessions))
        .route("/api/v2/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/v2/users/current/sessions", get(list_current_user_sessions))
        .route(
            "/api/v2/users/current/sessions/{id}",
            axum::routing::delete(delete_current_user_session),
        )
        .route(
            "/api/v2/sessions/current",
            get(get_current_session).delete(delete_current_session),
        )
}

/// A session as exposed by the management API.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: i64,
    pub user_id: i64,
    pub client_id: Option<String>,
    pub device_id: Option<i64>,
    pub last_seen_at: DateTime<Utc>,
    pub last_seen_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

impl From<&Session> for SessionResponse {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            client_id: s.client_id.clone(),
            device_id: s.device_id,
            last_seen_at: s.last_seen_at,
            last_seen_ip: s.last_seen_ip.clone(),
            user_agent: s.user_agent.clone(),
            created_at: s.created_at,
            expired_at: s.expired_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionList {
    pub results: Vec<SessionResponse>,
    pub total_size: u64,
    pub offset: u64,
    pub limit: u64,
}

impl From<PaginatedResult<Session>> for SessionList {
    fn from(page: PaginatedResult<Session>) -> Self {
        Self {
            results: page.items.iter().map(SessionResponse::from).collect(),
            total_size: page.total,
            offset: page.offset,
            limit: page.limit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl ListQuery {
    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        let limit = match self.limit {
            Some(limit) if limit > 0 && limit <= MAX_PAGE_SIZE => limit,
            _ => defaults.limit,
        };
        Pagination {
            offset: self.offset.unwrap_or(defaults.offset),
            limit,
        }
    }
}

async fn list_user_sessions(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<SessionList>, ApiError> {
    let user_id = parse_public_id("user", &id)?;
    let page = state
        .sessions
        .list_sessions(&ctx, Some(user_id), query.pagination())
        .await?;
    Ok(Json(page.into()))
}

async fn list_current_user_sessions(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    CurrentUser(me): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<SessionList>, ApiError> {
    let page = state
        .sessions
        .list_sessions(&ctx, Some(me.id), query.pagination())
        .await?;
    Ok(Json(page.into()))
}

async fn get_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.sessions.find_by_public_id(&ctx, &id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn get_current_session(
    CurrentSession(session): CurrentSession,
) -> Json<SessionResponse> {
    Json(SessionResponse::from(&session))
}

async fn delete_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_public_id("session", &id)?;
    state.sessions.invalidate_by_id(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_current_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    CurrentSession(session): CurrentSession,
) -> Result<StatusCode, ApiError> {
    state.sessions.invalidate_by_id(&ctx, session.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_current_user_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_public_id("session", &id)?;
    let session = state.sessions.find_by_id(&ctx, id).await?;
    // Another user's session reports NotFound so IDs cannot be probed.
    if session.user_id != me.id {
        return Err(AuthcoreError::NotFound {
            entity: "session".into(),
            id: id.to_string(),
        }
        .into());
    }
    state.sessions.invalidate_by_id(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped_to_default() {
        let p = ListQuery::default().pagination();
        assert_eq!((p.offset, p.limit), (0, 50));

        let p = ListQuery {
            offset: Some(20),
            limit: Some(10),
        }
        .pagination();
        assert_eq!((p.offset, p.limit), (20, 10));

        for limit in [0, MAX_PAGE_SIZE + 1] {
            let p = ListQuery {
                offset: None,
                limit: Some(limit),
            }
            .pagination();
            assert_eq!(p.limit, 50);
        }
    }
}
