//! Access-token authentication.
//!
//! Requests without a bearer token continue as [`Subject::Guest`]; the
//! enforcement layer decides whether guests may proceed. A presented
//! token must verify, and user tokens must refer to an existing user and
//! a live session.

use authcore_core::models::session::Session;
use authcore_core::models::user::User;
use authcore_core::repository::UserRepository;
use authcore_core::{AuthcoreError, ErrorKind, RequestContext, Subject};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

const BEARER: &str = "Bearer ";

/// The authenticated user, present for user tokens only.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The session behind a user token.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AuthcoreError::unauthenticated("no current user").into())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| AuthcoreError::unauthenticated("no current session").into())
    }
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = request_context(req.headers()).with_timeout(state.request_timeout);

    let subject = match bearer_token(req.headers()).map(str::to_owned) {
        None => Subject::Guest,
        Some(token) => {
            let verified = state.sessions.verify_access_token(&ctx, &token)?;
            let subject = verified
                .subject()
                .map_err(|e| as_unauthenticated(e, "invalid subject"))?;
            if let Subject::User(user_id) = subject {
                let (user, session) = load_user_session(&state, &ctx, user_id, &verified.sid).await?;
                req.extensions_mut().insert(CurrentUser(user));
                req.extensions_mut().insert(CurrentSession(session));
            }
            subject
        }
    };

    req.extensions_mut().insert(subject);
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

async fn load_user_session(
    state: &AppState,
    ctx: &RequestContext,
    user_id: i64,
    session_id: &str,
) -> Result<(User, Session), AuthcoreError> {
    let user = ctx
        .run(state.sessions.users().get_by_id(user_id))
        .await
        .map_err(|e| as_unauthenticated(e, "current user not found"))?;
    let session = state
        .sessions
        .find_by_public_id(ctx, session_id)
        .await
        .map_err(|e| as_unauthenticated(e, "invalid session"))?;
    if session.user_id != user.id {
        return Err(AuthcoreError::unauthenticated("session belongs to another user"));
    }
    Ok((user, session))
}

/// Lookup misses caused by the token's contents are authentication
/// failures; storage errors pass through.
fn as_unauthenticated(err: AuthcoreError, reason: &str) -> AuthcoreError {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::InvalidArgument => AuthcoreError::unauthenticated(reason),
        _ => err,
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER)?.trim();
    (!token.is_empty()).then_some(token)
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    let mut ctx = RequestContext::new();
    if let Some(ip) = client_ip(headers) {
        ctx = ctx.with_ip_address(ip);
    }
    if let Some(agent) = headers.get(USER_AGENT).and_then(|v| v.to_str().ok()) {
        ctx = ctx.with_user_agent(agent);
    }
    ctx
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };
    forwarded.or_else(real_ip).map(str::to_string)
}
