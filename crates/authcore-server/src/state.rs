//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use authcore_auth::{AuthContext, SessionStore};
use authcore_core::AuthcoreResult;
use authcore_db::repository::{
    SurrealRoleRepository, SurrealSessionRepository, SurrealUserRepository,
};
use authcore_rbac::{Enforcer, PolicySource, RoleResolver};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

pub type Sessions = SessionStore<SurrealSessionRepository<Any>, SurrealUserRepository<Any>>;
pub type Authorizer = Enforcer<SurrealRoleRepository<Any>>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<Sessions>,
    pub enforcer: Arc<Authorizer>,
    /// Deadline applied to each request's storage calls.
    pub request_timeout: Duration,
}

impl AppState {
    pub async fn new(
        db: Surreal<Any>,
        context: Arc<AuthContext>,
        policy: &PolicySource,
        request_timeout: Duration,
    ) -> AuthcoreResult<Self> {
        let sessions = SessionStore::new(
            SurrealSessionRepository::new(db.clone()),
            SurrealUserRepository::new(db.clone()),
            Arc::clone(&context),
        );
        let resolver = RoleResolver::new(SurrealRoleRepository::new(db), context);
        let enforcer = Enforcer::new(policy, resolver).await?;
        Ok(Self {
            sessions: Arc::new(sessions),
            enforcer: Arc::new(enforcer),
            request_timeout,
        })
    }
}
