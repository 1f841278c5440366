//! Role-graph adapter bridging dynamic and static role assignment.
//!
//! Nodes are rendered subjects (`u:1`, `serviceaccount:ci`) and role nodes
//! (`r:authcore.admin`). Subject→role edges come from the
//! [`RoleResolver`]; role→role edges come from the `g` rules of the policy
//! and live in a casbin [`DefaultRoleManager`]. This is the only copy of
//! the `g` rules: the enforcer asks the graph for a subject's roles and
//! never loads them into its matcher.

use std::collections::{BTreeSet, HashSet};

use authcore_core::repository::RoleRepository;
use authcore_core::subject::{role_name, role_node};
use authcore_core::{AuthcoreError, AuthcoreResult, RequestContext, Subject};
use casbin::{DefaultRoleManager, RoleManager};
use parking_lot::Mutex;

use crate::resolver::RoleResolver;

/// Maximum depth of role→role inheritance chains.
pub const MAX_HIERARCHY_LEVEL: usize = 10;

pub struct RoleGraph<R: RoleRepository> {
    resolver: RoleResolver<R>,
    links: Mutex<DefaultRoleManager>,
}

impl<R: RoleRepository> RoleGraph<R> {
    /// Build the graph with the static `(member, role)` links of the policy.
    pub fn new(resolver: RoleResolver<R>, links: &[(String, String)]) -> Self {
        let mut manager = DefaultRoleManager::new(MAX_HIERARCHY_LEVEL);
        for (member, role) in links {
            manager.add_link(member, role, None);
        }
        Self {
            resolver,
            links: Mutex::new(manager),
        }
    }

    pub fn resolver(&self) -> &RoleResolver<R> {
        &self.resolver
    }

    /// Whether `name1` reaches `name2`, directly or through inherited roles.
    pub async fn has_link(
        &self,
        ctx: &RequestContext,
        name1: &str,
        name2: &str,
        domain: Option<&str>,
    ) -> AuthcoreResult<bool> {
        reject_domain(domain)?;
        if name1 == name2 {
            return Ok(true);
        }
        if Subject::has_dynamic_prefix(name1) {
            for role in self.get_roles(ctx, name1, None).await? {
                if role == name2 || self.static_link(&role, name2) {
                    return Ok(true);
                }
            }
        }
        Ok(self.static_link(name1, name2))
    }

    /// Role nodes held directly by `name`. Names without a user or
    /// service-account prefix hold no dynamic roles.
    pub async fn get_roles(
        &self,
        ctx: &RequestContext,
        name: &str,
        domain: Option<&str>,
    ) -> AuthcoreResult<Vec<String>> {
        reject_domain(domain)?;
        if !Subject::has_dynamic_prefix(name) {
            return Ok(Vec::new());
        }
        let subject: Subject = name.parse()?;
        self.roles_of(ctx, &subject).await
    }

    /// Role nodes held directly by an already parsed subject.
    pub async fn roles_of(
        &self,
        ctx: &RequestContext,
        subject: &Subject,
    ) -> AuthcoreResult<Vec<String>> {
        let names = self.resolver.roles_of(ctx, subject).await?;
        Ok(names.iter().map(|name| role_node(name)).collect())
    }

    /// Every role node `subject` holds: its direct roles followed by the
    /// roles they inherit through static links, breadth first. Chains
    /// deeper than [`MAX_HIERARCHY_LEVEL`] are cut off.
    pub async fn expand(
        &self,
        ctx: &RequestContext,
        subject: &Subject,
    ) -> AuthcoreResult<Vec<String>> {
        let direct = self.roles_of(ctx, subject).await?;
        let subject = subject.to_string();

        let links = self.links.lock();
        let mut frontier = direct;
        frontier.extend(links.get_roles(&subject, None));

        let mut seen = HashSet::new();
        let mut held = Vec::new();
        for _ in 0..MAX_HIERARCHY_LEVEL {
            let mut next = Vec::new();
            for node in frontier {
                if node != subject && seen.insert(node.clone()) {
                    next.extend(links.get_roles(&node, None));
                    held.push(node);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        Ok(held)
    }

    /// Subjects holding the role node `role` directly.
    pub async fn get_users(
        &self,
        ctx: &RequestContext,
        role: &str,
        domain: Option<&str>,
    ) -> AuthcoreResult<BTreeSet<Subject>> {
        reject_domain(domain)?;
        self.resolver.holders_of(ctx, role_name(role)?).await
    }

    fn static_link(&self, name1: &str, name2: &str) -> bool {
        self.links.lock().has_link(name1, name2, None)
    }
}

fn reject_domain(domain: Option<&str>) -> AuthcoreResult<()> {
    match domain {
        Some(domain) => Err(AuthcoreError::invalid_argument(format!(
            "role domains are not supported: {domain}"
        ))),
        None => Ok(()),
    }
}
