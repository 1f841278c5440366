//! Access-token issuance.

use authcore_core::repository::UserRepository;
use authcore_core::{AuthcoreError, RequestContext};
use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

#[derive(Debug, Deserialize)]
pub struct CreateAccessTokenRequest {
    pub grant_type: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
}

/// Exchange a grant for an access token.
///
/// Only the refresh-token grant is served here. An unknown or spent
/// refresh token is PermissionDenied, as is a locked owner.
pub async fn create_access_token(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateAccessTokenRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    if req.grant_type != GRANT_REFRESH_TOKEN {
        return Err(AuthcoreError::invalid_argument(format!(
            "unsupported grant type: {}",
            req.grant_type
        ))
        .into());
    }

    let mut session = state
        .sessions
        .find_by_refresh_token(&ctx, &req.token)
        .await
        .map_err(not_found_as_denied)?;
    let user = ctx
        .run(state.sessions.users().get_by_id(session.user_id))
        .await
        .map_err(not_found_as_denied)?;
    if user.is_currently_locked() {
        return Err(AuthcoreError::permission_denied("user is locked").into());
    }

    let refresh_token = state.sessions.refresh(&ctx, &mut session, false).await?;
    let bundle = state
        .sessions
        .generate_access_token(&ctx, &session, true)
        .await?;
    info!(session_id = session.id, user_id = user.id, "access token issued");

    Ok(Json(AccessTokenResponse {
        access_token: bundle.access_token,
        id_token: bundle.id_token,
        refresh_token,
        token_type: "Bearer".into(),
        expires_in: bundle.expires_in,
    }))
}

fn not_found_as_denied(err: AuthcoreError) -> AuthcoreError {
    if err.is_not_found() {
        AuthcoreError::permission_denied("invalid grant")
    } else {
        err
    }
}
