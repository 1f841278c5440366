//! Authorization decisions over `(subject, object, action)` triples.

use authcore_core::repository::RoleRepository;
use authcore_core::{AuthcoreResult, RequestContext, Subject};
use casbin::prelude::{CoreApi, DefaultModel, MemoryAdapter, MgmtApi};
use tracing::debug;

use crate::policy::PolicySource;
use crate::policy_error;
use crate::resolver::RoleResolver;
use crate::role_graph::RoleGraph;

/// Outcome of one authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// Role nodes the subject holds, directly or through inheritance.
    pub roles: Vec<String>,
}

/// Wraps a casbin enforcer loaded with a fixed rule table.
///
/// Role lookups are I/O, so the subject is expanded through the
/// [`RoleGraph`] into itself plus every role node it holds before casbin
/// evaluates the `p` rules. The matcher never sees the `g` rules.
pub struct Enforcer<R: RoleRepository> {
    matcher: casbin::Enforcer,
    graph: RoleGraph<R>,
}

impl<R: RoleRepository> Enforcer<R> {
    pub async fn new(source: &PolicySource, resolver: RoleResolver<R>) -> AuthcoreResult<Self> {
        let model = DefaultModel::from_str(source.model())
            .await
            .map_err(policy_error)?;
        let mut matcher = casbin::Enforcer::new(model, MemoryAdapter::default())
            .await
            .map_err(policy_error)?;

        let permissions = source.permissions();
        if !permissions.is_empty() {
            matcher
                .add_policies(permissions)
                .await
                .map_err(policy_error)?;
        }

        Ok(Self {
            matcher,
            graph: RoleGraph::new(resolver, &source.inheritance()),
        })
    }

    pub fn graph(&self) -> &RoleGraph<R> {
        &self.graph
    }

    /// Decide whether `subject` may perform `action` on `object`.
    pub async fn decide(
        &self,
        ctx: &RequestContext,
        subject: &Subject,
        object: &str,
        action: &str,
    ) -> AuthcoreResult<Decision> {
        let roles = self.graph.expand(ctx, subject).await?;
        let subject = subject.to_string();
        for node in std::iter::once(&subject).chain(roles.iter()) {
            let allowed = self
                .matcher
                .enforce((node.as_str(), object, action))
                .map_err(policy_error)?;
            if allowed {
                debug!(sub = %subject, via = %node, obj = object, act = action, "allowed");
                return Ok(Decision {
                    allowed: true,
                    roles,
                });
            }
        }
        Ok(Decision {
            allowed: false,
            roles,
        })
    }

    pub async fn enforce(
        &self,
        ctx: &RequestContext,
        subject: &Subject,
        object: &str,
        action: &str,
    ) -> AuthcoreResult<bool> {
        Ok(self.decide(ctx, subject, object, action).await?.allowed)
    }
}
