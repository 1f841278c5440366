//! Session store: session lifecycle and token issuance.
//!
//! Concurrent refreshes of one session are not serialized: each
//! persists its own refresh-token hash and the last write wins. A
//! client holding a token from the losing refresh fails its next
//! refresh with `NotFound` and has to sign in again.

use std::sync::Arc;

use authcore_core::error::AuthcoreResult;
use authcore_core::models::parse_public_id;
use authcore_core::models::session::{CreateSession, Session};
use authcore_core::repository::{
    PaginatedResult, Pagination, SessionRepository, UserRepository,
};
use authcore_core::RequestContext;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::context::AuthContext;
use crate::error::AuthError;
use crate::keys::PublicJwk;
use crate::token::{self, AccessToken, IdTokenProfile, VerifiedToken};
use crate::user_agent;

/// Input for [`SessionStore::create_session`].
#[derive(Debug, Clone, Default)]
pub struct CreateSessionInput {
    pub user_id: i64,
    pub device_id: Option<i64>,
    /// Client ID as presented by the caller; resolved against the
    /// application registry.
    pub client_id: String,
    /// Refresh token carried over from a token exchange. A new one is
    /// generated when absent.
    pub refresh_token: Option<String>,
    pub password_verified: bool,
}

/// Session store.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct SessionStore<S: SessionRepository, U: UserRepository> {
    sessions: S,
    users: U,
    context: Arc<AuthContext>,
}

impl<S: SessionRepository, U: UserRepository> SessionStore<S, U> {
    pub fn new(sessions: S, users: U, context: Arc<AuthContext>) -> Self {
        Self {
            sessions,
            users,
            context,
        }
    }

    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    /// Create an authenticated session for a user.
    ///
    /// The returned session carries the plaintext refresh token; it is
    /// not recoverable afterwards.
    pub async fn create_session(
        &self,
        ctx: &RequestContext,
        input: CreateSessionInput,
    ) -> AuthcoreResult<Session> {
        ctx.ensure_active()?;
        let app = self.context.applications().resolve(&input.client_id)?;

        let refresh_token = match input.refresh_token {
            Some(token) if !token.is_empty() => token,
            _ => token::generate_refresh_token(),
        };
        let now = Utc::now();

        let mut session = ctx
            .run(self.sessions.create(CreateSession {
                user_id: input.user_id,
                client_id: Some(app.id.clone()),
                device_id: input.device_id,
                is_machine: false,
                refresh_token_hash: token::hash_refresh_token(&refresh_token),
                last_seen_at: now,
                last_seen_ip: ctx.ip_address.clone(),
                last_seen_location: None,
                user_agent: Some(user_agent::describe(ctx.user_agent.as_deref())),
                last_password_verified_at: input.password_verified.then_some(now),
                expired_at: now + self.context.session_ttl(),
            }))
            .await?;
        session.refresh_token = Some(refresh_token);

        if let Err(err) = ctx
            .run(self.users.update_last_seen_at(session.user_id, session.last_seen_at))
            .await
        {
            warn!(user_id = session.user_id, error = %err, "failed to update user last seen");
        }

        info!(
            session_id = session.id,
            user_id = session.user_id,
            client_id = %app.id,
            "session created"
        );
        Ok(session)
    }

    /// Create a machine-to-machine session. Always issues a new refresh
    /// token and has no client or device association.
    pub async fn create_machine_session(
        &self,
        ctx: &RequestContext,
        user_id: i64,
    ) -> AuthcoreResult<Session> {
        ctx.ensure_active()?;
        let refresh_token = token::generate_refresh_token();
        let now = Utc::now();

        let mut session = ctx
            .run(self.sessions.create(CreateSession {
                user_id,
                client_id: None,
                device_id: None,
                is_machine: true,
                refresh_token_hash: token::hash_refresh_token(&refresh_token),
                last_seen_at: now,
                last_seen_ip: ctx.ip_address.clone(),
                last_seen_location: None,
                user_agent: None,
                last_password_verified_at: None,
                expired_at: now + self.context.session_ttl(),
            }))
            .await?;
        session.refresh_token = Some(refresh_token);

        info!(session_id = session.id, user_id, "machine session created");
        Ok(session)
    }

    /// Renew a session: update last-seen fields, push the expiry out by
    /// the session lifetime and, if `rotate`, replace the refresh token.
    ///
    /// Returns the new plaintext refresh token when rotated. This is the
    /// only operation that changes a session's refresh-token hash.
    pub async fn refresh(
        &self,
        ctx: &RequestContext,
        session: &mut Session,
        rotate: bool,
    ) -> AuthcoreResult<Option<String>> {
        ctx.ensure_active()?;
        let now = Utc::now();

        let mut next = session.clone();
        next.last_seen_at = now;
        next.last_seen_location = None;
        if let Some(ip) = &ctx.ip_address {
            next.last_seen_ip = Some(ip.clone());
        }
        if let Some(raw) = ctx.user_agent.as_deref() {
            next.user_agent = Some(user_agent::describe(Some(raw)));
        }
        next.expired_at = now + self.context.session_ttl();

        let new_token = rotate.then(token::generate_refresh_token);
        if let Some(token) = &new_token {
            next.refresh_token_hash = token::hash_refresh_token(token);
        }

        let updated = ctx.run(self.sessions.update(&next)).await?;
        ctx.run(self.users.update_last_seen_at(updated.user_id, updated.last_seen_at))
            .await?;

        *session = Session {
            refresh_token: new_token.clone(),
            ..updated
        };
        Ok(new_token)
    }

    /// Stamp a fresh password verification, opening the window for
    /// sensitive account changes.
    pub async fn record_password_verified(
        &self,
        ctx: &RequestContext,
        session: &mut Session,
    ) -> AuthcoreResult<()> {
        ctx.ensure_active()?;
        let mut next = session.clone();
        next.last_password_verified_at = Some(Utc::now());

        let updated = ctx.run(self.sessions.update(&next)).await?;
        *session = Session {
            refresh_token: session.refresh_token.take(),
            ..updated
        };
        Ok(())
    }

    pub async fn find_by_id(&self, ctx: &RequestContext, id: i64) -> AuthcoreResult<Session> {
        ctx.run(self.sessions.get_live_by_id(id)).await
    }

    pub async fn find_by_public_id(
        &self,
        ctx: &RequestContext,
        public_id: &str,
    ) -> AuthcoreResult<Session> {
        let id = parse_public_id("session", public_id)?;
        self.find_by_id(ctx, id).await
    }

    pub async fn find_by_refresh_token(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> AuthcoreResult<Session> {
        let hash = token::hash_refresh_token(refresh_token);
        ctx.run(self.sessions.get_live_by_refresh_token_hash(&hash))
            .await
    }

    /// Live sessions, most recently seen first. `None` lists every
    /// user's sessions.
    pub async fn list_sessions(
        &self,
        ctx: &RequestContext,
        user_id: Option<i64>,
        pagination: Pagination,
    ) -> AuthcoreResult<PaginatedResult<Session>> {
        ctx.run(self.sessions.list_live(user_id, pagination)).await
    }

    /// Invalidate a live session. Fails with `NotFound` if the session
    /// is already invalid or expired.
    pub async fn invalidate_by_id(&self, ctx: &RequestContext, id: i64) -> AuthcoreResult<()> {
        let session = self.find_by_id(ctx, id).await?;
        ctx.run(self.sessions.invalidate(session.id)).await?;
        info!(session_id = session.id, user_id = session.user_id, "session invalidated");
        Ok(())
    }

    /// Mint an access token (and optionally an ID token) asserting the
    /// session. Refused for a currently locked user.
    pub async fn generate_access_token(
        &self,
        ctx: &RequestContext,
        session: &Session,
        include_id_token: bool,
    ) -> AuthcoreResult<AccessToken> {
        let user = ctx.run(self.users.get_by_id(session.user_id)).await?;
        if user.is_currently_locked() {
            return Err(AuthError::AccountLocked.into());
        }
        ctx.ensure_active()?;

        let profile = include_id_token.then(|| IdTokenProfile::from(&user));
        let access_token = token::mint_access_token(
            self.context.signing_key(),
            self.context.token_settings(),
            &user.public_id(),
            &session.public_id(),
            session.client_id.as_deref().unwrap_or_default(),
            profile.as_ref(),
        )?;
        Ok(access_token)
    }

    /// Verify an access token against the system key or, for machine
    /// tokens, the issuing service account's key.
    pub fn verify_access_token(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> AuthcoreResult<VerifiedToken> {
        ctx.ensure_active()?;
        token::verify_access_token(
            self.context.signing_key().verifying_key(),
            self.context.service_accounts(),
            access_token,
        )
        .map_err(|err| {
            debug!(reason = %err, "access token rejected");
            err.into()
        })
    }

    /// The system public key, for JWKS publication.
    pub fn public_jwk(&self) -> &PublicJwk {
        self.context.public_jwk()
    }
}
