//! Direct role lookup for subjects.

use std::collections::BTreeSet;
use std::sync::Arc;

use authcore_auth::AuthContext;
use authcore_core::repository::RoleRepository;
use authcore_core::{AuthcoreResult, RequestContext, Subject};

/// Resolves which roles a subject holds directly.
///
/// Users are looked up in the role repository; service accounts come from
/// the configured registry. Inherited roles are not expanded here.
pub struct RoleResolver<R: RoleRepository> {
    roles: R,
    context: Arc<AuthContext>,
}

impl<R: RoleRepository> RoleResolver<R> {
    pub fn new(roles: R, context: Arc<AuthContext>) -> Self {
        Self { roles, context }
    }

    pub fn roles(&self) -> &R {
        &self.roles
    }

    /// Role names held by `subject`. Guests and unknown service accounts
    /// hold none.
    pub async fn roles_of(
        &self,
        ctx: &RequestContext,
        subject: &Subject,
    ) -> AuthcoreResult<Vec<String>> {
        match subject {
            Subject::User(id) => {
                let roles = ctx.run(self.roles.get_user_roles(*id)).await?;
                Ok(roles.into_iter().map(|role| role.name).collect())
            }
            Subject::ServiceAccount(id) => Ok(self
                .context
                .service_accounts()
                .get(id)
                .map(|account| account.roles().to_vec())
                .unwrap_or_default()),
            Subject::Guest => Ok(Vec::new()),
        }
    }

    /// Every user and service account holding `role_name` directly.
    pub async fn holders_of(
        &self,
        ctx: &RequestContext,
        role_name: &str,
    ) -> AuthcoreResult<BTreeSet<Subject>> {
        let user_ids = ctx
            .run(self.roles.find_user_ids_by_role_name(role_name))
            .await?;
        let mut holders: BTreeSet<Subject> = user_ids.into_iter().map(Subject::User).collect();
        holders.extend(
            self.context
                .service_accounts()
                .with_role(role_name)
                .map(|account| account.subject()),
        );
        Ok(holders)
    }
}
